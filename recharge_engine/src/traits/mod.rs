//! # Engine contracts
//!
//! This module defines the seams of the recharge engine. Concrete backends and collaborators implement these traits,
//! and the APIs in [`crate::engine_api`] are generic over them.
//!
//! * [`LedgerStore`] is the storage contract for orders and accounts. [`crate::InMemoryLedger`] and
//!   [`crate::SqliteLedger`] implement it.
//! * [`PaymentStrategy`] is one payment method. [`PaymentGateway`] is a real settlement network that strategies can
//!   delegate to, and [`OutcomePolicy`] decides mock settlement results.
//! * [`CallbackVerifier`] authenticates payment confirmations and [`QrEncoder`] renders payment links.
mod collaborators;
mod ledger_store;
mod payment_strategy;

pub use collaborators::{CallbackVerifier, QrEncoder};
pub use ledger_store::{LedgerStore, PaymentGatewayError};
pub use payment_strategy::{OutcomePolicy, PaymentGateway, PaymentStrategy};
