//! # Order events
//!
//! The engine publishes an event whenever an order changes state:
//! * [`OrderPaidEvent`] when payment is taken or confirmed,
//! * [`OrderRechargedEvent`] when an order becomes recharged,
//! * [`OrderFailedEvent`] when an order can no longer complete.
//!
//! Register callbacks with [`EventHooks`], turn them into [`EventHandlers`], and hand the resulting
//! [`EventProducers`] to the engine APIs.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
