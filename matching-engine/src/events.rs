//! Event sinks observing the matching engine
//!
//! Sinks are invoked synchronously, inline with the mutation that produced
//! the event. A sink must not call back into the engine.

use std::sync::{Arc, Mutex};

use common::model::event::BookEvent;
use common::model::trade::Trade;

/// Receiver of `New`, `Trade` and `Cancel` events
pub trait EventSink: Send {
    fn on_event(&mut self, event: &BookEvent);
}

/// Sink that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn on_event(&mut self, _event: &BookEvent) {}
}

/// Adapter turning a closure into a sink
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: FnMut(&BookEvent) + Send,
{
    fn on_event(&mut self, event: &BookEvent) {
        (self.0)(event)
    }
}

/// Shared sink, so the caller can read its state between engine calls
impl<T: EventSink> EventSink for Arc<Mutex<T>> {
    fn on_event(&mut self, event: &BookEvent) {
        // A poisoned lock only means another reader panicked; the projection is still usable
        let mut guard = match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.on_event(event);
    }
}

/// Sink that keeps every event it sees
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    events: Vec<BookEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in emission order
    pub fn events(&self) -> &[BookEvent] {
        &self.events
    }

    /// Only the trades, in emission order
    pub fn trades(&self) -> Vec<Trade> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BookEvent::Trade(trade) => Some(*trade),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Hand over everything recorded so far, leaving the recorder empty
    pub fn take_events(&mut self) -> Vec<BookEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventRecorder {
    fn on_event(&mut self, event: &BookEvent) {
        self.events.push(event.clone());
    }
}
