//! # Payment processing
//!
//! Payments are dispatched by the [`PaymentProcessor`] to one of the registered [`PaymentStrategy`] implementations:
//!
//! * [`DirectPayment`] settles against the payer's balance.
//! * [`WalletPayment`] settles through WeChat Pay or Alipay.
//! * [`QrCodePayment`] hands back a QR code; the payment is confirmed later by callback.
//!
//! Every strategy settles through a [`Settlement`]: either a mock [`OutcomePolicy`](crate::traits::OutcomePolicy) or
//! a real [`PaymentGateway`](crate::traits::PaymentGateway). Both produce the same normalized outcome, so the order
//! state machine cannot tell them apart.
//!
//! [`PaymentStrategy`]: crate::traits::PaymentStrategy
mod config;
mod methods;
mod policies;
mod processor;
mod strategies;

pub use config::{FailedPaymentPolicy, PaymentConfig, SignatureScheme};
pub use methods::{Funding, PaymentMethod};
pub use policies::{AlwaysApprove, AlwaysDecline, RandomApproval, ScriptedApproval};
pub use processor::PaymentProcessor;
pub use strategies::{DescriptorBuilder, DirectPayment, QrCodePayment, Settlement, WalletPayment};
