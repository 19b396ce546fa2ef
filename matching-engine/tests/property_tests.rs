use common::decimal::{Price, Quantity};
use common::model::order::{OrderId, Side};
use matching_engine::MatchingEngine;
use proptest::prelude::*;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
enum Op {
    Limit { side: Side, price: u32, size: u32 },
    /// Cancel the n-th order submitted so far (modulo count)
    Cancel(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<bool>(), 95u32..=105, 1u32..=50).prop_map(|(is_buy, price, size)| Op::Limit {
            side: if is_buy { Side::Buy } else { Side::Sell },
            price,
            size,
        }),
        1 => any::<usize>().prop_map(Op::Cancel),
    ]
}

proptest! {
    #[test]
    fn prop_book_never_crosses_and_levels_stay_consistent(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut engine = MatchingEngine::new();
        let mut submitted: Vec<OrderId> = Vec::new();

        for op in ops {
            match op {
                Op::Limit { side, price, size } => {
                    let handle = engine
                        .submit_limit_order(side, Price::from(price), Quantity::from(size))
                        .unwrap();
                    submitted.push(handle.id());
                }
                Op::Cancel(n) if !submitted.is_empty() => {
                    let id = submitted[n % submitted.len()];
                    let resting = engine.get_order(id).is_some();
                    prop_assert_eq!(engine.cancel_order(id).is_ok(), resting);
                }
                Op::Cancel(_) => {}
            }

            prop_assert!(engine.check_invariants().is_ok(), "{:?}", engine.check_invariants());
            if let (Some(bid), Some(ask)) = (engine.best_bid(), engine.best_ask()) {
                prop_assert!(bid < ask);
            }
        }
    }

    #[test]
    fn prop_trades_respect_taker_limit_and_conserve_size(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut engine = MatchingEngine::new();
        let mut submitted_size = Decimal::ZERO;
        let mut traded_size = Decimal::ZERO;
        let mut cancelled_size = Decimal::ZERO;
        let mut ids = Vec::new();

        for op in ops {
            match op {
                Op::Limit { side, price, size } => {
                    let limit = Price::from(price);
                    let handle = engine.submit_limit_order(side, limit, Quantity::from(size)).unwrap();
                    submitted_size += Quantity::from(size);
                    ids.push(handle.id());

                    let mut filled = Decimal::ZERO;
                    for trade in &handle.trades {
                        match side {
                            Side::Buy => prop_assert!(trade.price <= limit),
                            Side::Sell => prop_assert!(trade.price >= limit),
                        }
                        prop_assert_eq!(trade.taker_id, handle.id());
                        prop_assert!(trade.size > Decimal::ZERO);
                        filled += trade.size;
                    }
                    prop_assert_eq!(filled, handle.filled_size());
                    // Each trade removes size from both taker and maker
                    traded_size += filled * Decimal::TWO;
                }
                Op::Cancel(n) if !ids.is_empty() => {
                    if let Ok(order) = engine.cancel_order(ids[n % ids.len()]) {
                        cancelled_size += order.remaining_size;
                    }
                }
                Op::Cancel(_) => {}
            }
        }

        let resting: Quantity = engine
            .bid_levels(usize::MAX)
            .into_iter()
            .chain(engine.ask_levels(usize::MAX))
            .map(|(_, volume)| volume)
            .sum();
        prop_assert_eq!(submitted_size, traded_size + cancelled_size + resting);
    }

    #[test]
    fn prop_equal_price_orders_fill_in_arrival_order(sizes in prop::collection::vec(1u32..=20, 2..10), take in 1u32..=100) {
        let mut engine = MatchingEngine::new();
        let makers: Vec<_> = sizes
            .iter()
            .map(|size| engine.submit_limit_order(Side::Sell, Price::from(10), Quantity::from(*size)).unwrap().id())
            .collect();

        let handle = engine.submit_limit_order(Side::Buy, Price::from(10), Quantity::from(take)).unwrap();
        let matched: Vec<_> = handle.trades.iter().map(|t| t.maker_id).collect();
        prop_assert_eq!(&matched[..], &makers[..matched.len()]);
    }
}
