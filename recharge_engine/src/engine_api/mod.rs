//! # Recharge engine public API
//!
//! The `engine_api` module exposes the programmatic API for the recharge engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`order_flow_api`] creates orders and drives the order state machine.
//! * [`payment_api`] takes payments for pending orders, through the registered payment strategies.
//! * [`recharge_api`] verifies payment callbacks and credits the recipients of confirmed orders.
//! * [`accounts_api`] provides read access to accounts, along with registration and opening balances.
//! * [`balance_guard`] is the single gatekeeper for balance changes.
//!
//! The other submodules hold the data objects passed in and out of the APIs.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a ledger backend that
//! implements [`LedgerStore`](crate::traits::LedgerStore), plus whatever collaborators the API needs.
//!
//! ```rust,ignore
//! use recharge_engine::{InMemoryLedger, OrderFlowApi, events::EventProducers};
//! let db = InMemoryLedger::new();
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let order = api.create_order("13812345678", Cents::from_major(40)).await?;
//! ```

pub mod accounts_api;
pub mod balance_guard;
pub mod order_flow_api;
pub mod payment_api;
pub mod recharge_api;

pub mod account_objects;
pub mod order_objects;
pub mod payment_objects;
