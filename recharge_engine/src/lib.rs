//! Recharge Engine
//!
//! The recharge engine takes payments for account top-up orders and credits the recharged accounts once the payment
//! is confirmed. This library contains the core logic. It is transport-agnostic.
//!
//! The library is divided into these main sections:
//! 1. Ledger storage ([`mod@traits`], [`mod@memory`] and `sqlite`). Orders and balances live behind the
//!    [`LedgerStore`] trait, which has an in-memory and a SQLite implementation. You should never need to access the
//!    ledger directly. Instead, use the public API provided by the engine. The exception is the data types used in the
//!    ledger. These are defined in the [`mod@db_types`] module and are public.
//! 2. Payment processing ([`mod@payment`]). A registry of payment strategies, one per payment method.
//! 3. The engine public API ([`mod@engine_api`]). This is the public-facing functionality of the engine: creating
//!    orders, paying for them, handling payment callbacks, and reading balances.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when orders are paid,
//! recharged or fail. A simple Actor framework is used so that you can easily hook into these events and perform
//! custom actions.

pub mod db_types;
pub mod engine_api;
pub mod events;
pub mod helpers;
pub mod memory;
pub mod payment;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(all(feature = "sqlite", any(feature = "test_utils", test)))]
pub mod test_utils;

pub use engine_api::{
    account_objects,
    accounts_api::AccountApi,
    balance_guard::BalanceGuard,
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_api::PaymentApi,
    payment_objects,
    recharge_api::RechargeApi,
};
pub use memory::InMemoryLedger;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLedger;
pub use traits::{LedgerStore, PaymentGatewayError};
