use std::sync::{Arc, Mutex};

use common::decimal::{Price, Quantity};
use common::error::Error;
use common::model::event::BookEvent;
use common::model::order::{OrderId, Side, Status};
use common::model::trade::Trade;
use matching_engine::{EngineConfig, EventRecorder, FnSink, MatchingEngine};
use rust_decimal_macros::dec;

fn recording_engine() -> (MatchingEngine, Arc<Mutex<EventRecorder>>) {
    let recorder = Arc::new(Mutex::new(EventRecorder::new()));
    let config = EngineConfig::default().with_verification(true);
    let engine = MatchingEngine::with_sink(config, recorder.clone());
    (engine, recorder)
}

fn buy(engine: &mut MatchingEngine, price: Price, size: Quantity) -> OrderId {
    engine.submit_limit_order(Side::Buy, price, size).unwrap().id()
}

fn sell(engine: &mut MatchingEngine, price: Price, size: Quantity) -> OrderId {
    engine.submit_limit_order(Side::Sell, price, size).unwrap().id()
}

#[test]
fn test_basic_cross_empties_book() {
    let mut engine = MatchingEngine::new();
    let maker = buy(&mut engine, dec!(100), dec!(100));
    let handle = engine.submit_limit_order(Side::Sell, dec!(100), dec!(100)).unwrap();

    assert_eq!(handle.trades, vec![Trade::new(handle.id(), maker, dec!(100), dec!(100), Side::Sell)]);
    assert_eq!(handle.status(), Status::Filled);
    assert!(!handle.is_resting());
    assert!(engine.is_empty());
    assert_eq!(engine.best_bid(), None);
    assert_eq!(engine.best_ask(), None);

    // Same thing from the other side
    sell(&mut engine, dec!(100), dec!(100));
    assert_eq!(engine.best_ask(), Some(dec!(100)));
    buy(&mut engine, dec!(100), dec!(100));
    assert!(engine.is_empty());
}

#[test]
fn test_partial_sweep_walks_best_price_first() {
    let (mut engine, recorder) = recording_engine();
    let at_100 = buy(&mut engine, dec!(100), dec!(100));
    let at_101 = buy(&mut engine, dec!(101), dec!(100));
    let at_102 = buy(&mut engine, dec!(102), dec!(100));

    let taker = engine.submit_limit_order(Side::Sell, dec!(100), dec!(150)).unwrap();

    assert_eq!(
        taker.trades,
        vec![
            Trade::new(taker.id(), at_102, dec!(100), dec!(102), Side::Sell),
            Trade::new(taker.id(), at_101, dec!(50), dec!(101), Side::Sell),
        ]
    );
    assert_eq!(recorder.lock().unwrap().trades(), taker.trades);
    assert_eq!(engine.best_bid(), Some(dec!(101)));
    assert_eq!(engine.bid_levels(1), vec![(dec!(101), dec!(50))]);
    assert!(engine.bids().level_at(dec!(102)).is_none());
    assert_eq!(engine.depth_at(dec!(100)), dec!(100));
    assert!(engine.get_order(at_100).is_some());
    assert!(engine.get_order(at_102).is_none());
    assert_eq!(engine.get_order(at_101).unwrap().remaining_size, dec!(50));
}

#[test]
fn test_depth_aggregation_and_level_removal() {
    let mut engine = MatchingEngine::new();
    buy(&mut engine, dec!(100), dec!(100));
    buy(&mut engine, dec!(100), dec!(50));
    assert_eq!(engine.depth_at(dec!(100)), dec!(150));
    assert_eq!(engine.bids().level_at(dec!(100)).unwrap().order_count(), 2);

    sell(&mut engine, dec!(100), dec!(150));
    assert_eq!(engine.depth_at(dec!(100)), dec!(0));
    assert!(engine.bids().level_at(dec!(100)).is_none());
    assert!(engine.bids().is_empty());
}

#[test]
fn test_cancel_filled_order_is_unknown() {
    let mut engine = MatchingEngine::new();
    let maker = sell(&mut engine, dec!(50), dec!(10));
    buy(&mut engine, dec!(50), dec!(10));

    match engine.cancel_order(maker) {
        Err(Error::UnknownOrder(id)) => assert_eq!(id, maker),
        other => panic!("expected UnknownOrder, got {:?}", other),
    }
    assert!(matches!(engine.cancel_order(OrderId(999)), Err(Error::UnknownOrder(_))));
}

#[test]
fn test_cancel_leaves_other_levels() {
    let (mut engine, recorder) = recording_engine();
    let first = buy(&mut engine, dec!(100), dec!(50));
    engine.cancel_order(first).unwrap();
    assert!(engine.bids().is_empty());

    let second = buy(&mut engine, dec!(100), dec!(100));
    buy(&mut engine, dec!(101), dec!(100));
    engine.cancel_order(second).unwrap();
    assert_eq!(engine.bid_levels(10), vec![(dec!(101), dec!(100))]);

    let cancels: Vec<_> = recorder
        .lock()
        .unwrap()
        .events()
        .iter()
        .filter_map(|event| match event {
            BookEvent::Cancel { order } => Some(order.id),
            _ => None,
        })
        .collect();
    assert_eq!(cancels, vec![first, second]);
}

#[test]
fn test_time_priority_within_level() {
    let mut engine = MatchingEngine::new();
    let early = sell(&mut engine, dec!(10), dec!(5));
    let late = sell(&mut engine, dec!(10), dec!(5));

    let handle = engine.submit_limit_order(Side::Buy, dec!(10), dec!(7)).unwrap();
    assert_eq!(handle.trades.len(), 2);
    assert_eq!(handle.trades[0].maker_id, early);
    assert_eq!(handle.trades[0].size, dec!(5));
    assert_eq!(handle.trades[1].maker_id, late);
    assert_eq!(handle.trades[1].size, dec!(2));
}

#[test]
fn test_partial_fill_keeps_queue_position() {
    let mut engine = MatchingEngine::new();
    let first = sell(&mut engine, dec!(10), dec!(5));
    let second = sell(&mut engine, dec!(10), dec!(5));

    // Partially fill the head of the queue
    buy(&mut engine, dec!(10), dec!(2));
    assert_eq!(engine.get_order(first).unwrap().remaining_size, dec!(3));
    assert_eq!(engine.get_order(first).unwrap().status, Status::PartiallyFilled);

    // A later order at the same price queues behind both
    let third = sell(&mut engine, dec!(10), dec!(5));

    let handle = engine.submit_limit_order(Side::Buy, dec!(10), dec!(9)).unwrap();
    let makers: Vec<_> = handle.trades.iter().map(|t| (t.maker_id, t.size)).collect();
    assert_eq!(makers, vec![(first, dec!(3)), (second, dec!(5)), (third, dec!(1))]);
    assert_eq!(engine.depth_at(dec!(10)), dec!(4));
}

#[test]
fn test_trade_price_is_maker_price() {
    let mut engine = MatchingEngine::new();
    sell(&mut engine, dec!(99.5), dec!(1));
    sell(&mut engine, dec!(100.25), dec!(1));

    let handle = engine.submit_limit_order(Side::Buy, dec!(105), dec!(2)).unwrap();
    let prices: Vec<_> = handle.trades.iter().map(|t| t.price).collect();
    assert_eq!(prices, vec![dec!(99.5), dec!(100.25)]);
    assert!(prices.iter().all(|p| *p <= dec!(105)));
}

#[test]
fn test_taker_stops_at_limit_and_rests() {
    let (mut engine, recorder) = recording_engine();
    sell(&mut engine, dec!(101), dec!(1));
    sell(&mut engine, dec!(103), dec!(1));

    let handle = engine.submit_limit_order(Side::Buy, dec!(102), dec!(5)).unwrap();
    assert_eq!(handle.trades.len(), 1);
    assert_eq!(handle.status(), Status::PartiallyFilled);
    assert_eq!(engine.best_bid(), Some(dec!(102)));
    assert_eq!(engine.best_ask(), Some(dec!(103)));
    assert_eq!(engine.depth_at(dec!(102)), dec!(4));

    // Trade first, then the resting remainder
    let events = recorder.lock().unwrap().events().to_vec();
    let tail: Vec<_> = events.iter().rev().take(2).map(BookEvent::name).collect();
    assert_eq!(tail, vec!["new", "trade"]);
    match events.last() {
        Some(BookEvent::New { order }) => {
            assert_eq!(order.id, handle.id());
            assert_eq!(order.original_size, dec!(5));
            assert_eq!(order.remaining_size, dec!(4));
        }
        other => panic!("expected New event, got {:?}", other),
    }
}

#[test]
fn test_fully_filled_taker_emits_no_new_event() {
    let (mut engine, recorder) = recording_engine();
    sell(&mut engine, dec!(100), dec!(10));
    recorder.lock().unwrap().clear();

    buy(&mut engine, dec!(100), dec!(4));
    let names: Vec<_> = recorder.lock().unwrap().events().iter().map(BookEvent::name).collect();
    assert_eq!(names, vec!["trade"]);
}

#[test]
fn test_invalid_order_emits_nothing() {
    let (mut engine, recorder) = recording_engine();
    assert!(matches!(
        engine.submit_limit_order(Side::Buy, dec!(100), dec!(-3)),
        Err(Error::InvalidOrder(_))
    ));
    assert!(recorder.lock().unwrap().events().is_empty());
    assert!(engine.is_empty());
}

#[test]
fn test_sequences_strictly_increase() {
    let mut engine = MatchingEngine::new();
    let mut sequences = Vec::new();
    for i in 0..5 {
        let handle = engine.submit_limit_order(Side::Buy, dec!(100) + Price::from(i), dec!(1)).unwrap();
        sequences.push(handle.order.sequence);
    }
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    assert_eq!(engine.last_sequence(), 5);
}

#[test]
fn test_multiple_sinks_in_registration_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut engine = MatchingEngine::new();
    for tag in ["first", "second"] {
        let seen = seen.clone();
        engine.subscribe(FnSink(move |event: &BookEvent| {
            seen.lock().unwrap().push((tag, event.name()));
        }));
    }

    buy(&mut engine, dec!(1), dec!(1));
    assert_eq!(*seen.lock().unwrap(), vec![("first", "new"), ("second", "new")]);
}

#[test]
fn test_snapshot_levels_best_first() {
    let mut engine = MatchingEngine::new();
    buy(&mut engine, dec!(98), dec!(1));
    buy(&mut engine, dec!(99), dec!(2));
    sell(&mut engine, dec!(102), dec!(3));
    sell(&mut engine, dec!(101), dec!(4));

    assert_eq!(engine.bid_levels(5), vec![(dec!(99), dec!(2)), (dec!(98), dec!(1))]);
    assert_eq!(engine.ask_levels(1), vec![(dec!(101), dec!(4))]);
    assert_eq!(engine.order_count(), 4);
    assert_eq!(engine.spread(), Some(dec!(2)));
}
