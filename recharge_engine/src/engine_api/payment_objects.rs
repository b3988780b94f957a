use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rpg_common::Cents;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{AccountId, Order, OrderId, OrderStatusType},
    payment::PaymentMethod,
};

/// Optional parameters that accompany a payment request.
///
/// If `amount` is given, it must match the order amount exactly. Anything else is passed through to the strategy
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentParams {
    pub amount: Option<Cents>,
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

impl PaymentParams {
    pub fn with_amount(mut self, amount: Cents) -> Self {
        self.amount = Some(amount);
        self
    }
}

/// What a payment strategy is asked to settle.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub payer: AccountId,
    pub amount: Cents,
    pub extra: HashMap<String, String>,
}

impl PaymentRequest {
    pub fn for_order(order: &Order, extra: HashMap<String, String>) -> Self {
        Self { order_id: order.id.clone(), payer: order.account.clone(), amount: order.amount, extra }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Fail,
}

/// The normalized result of a settlement attempt, whether it came from a mock policy or a real gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub status: OutcomeStatus,
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
}

impl PaymentOutcome {
    pub fn new(order_id: OrderId, method: PaymentMethod, status: OutcomeStatus) -> Self {
        Self { order_id, method, status, transaction_id: method.new_transaction_id(), timestamp: Utc::now() }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Everything a payer needs to complete an out-of-band (QR code) payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDescriptor {
    pub order_id: OrderId,
    pub amount: Cents,
    pub destination_url: String,
    /// The QR code for `destination_url`, as a `data:` URI
    pub encoded_image: String,
}

/// What a strategy hands back from a payment attempt.
#[derive(Debug, Clone)]
pub enum StrategyResult {
    /// Settlement finished, successfully or not.
    Completed(PaymentOutcome),
    /// Settlement happens elsewhere; a callback will confirm it.
    Initiated(PaymentDescriptor),
}

/// The result of [`PaymentApi::process_payment`](crate::PaymentApi::process_payment).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PaymentResult {
    /// The order is now paid, and the payer has been debited if the method is balance-funded.
    Paid { order: Order, outcome: PaymentOutcome },
    /// The payment was declined. `order` reflects the configured failed-payment policy.
    Declined { order: Order, outcome: PaymentOutcome },
    /// The payer must complete the payment out of band.
    AwaitingConfirmation(PaymentDescriptor),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusReport {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub transaction_id: String,
    pub last_checked: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Refunded,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub order_id: OrderId,
    pub refund_id: String,
    pub amount: Cents,
    pub status: RefundStatus,
    pub timestamp: DateTime<Utc>,
}

/// An inbound payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub order_id: OrderId,
    pub signature: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl CallbackPayload {
    pub fn new<S: Into<String>>(order_id: OrderId, signature: S) -> Self {
        Self { order_id, signature: signature.into(), transaction_id: None }
    }

    pub fn with_transaction_id<S: Into<String>>(mut self, txid: S) -> Self {
        self.transaction_id = Some(txid.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CallbackResult {
    /// This callback credited the recipient.
    Recharged { order: Order, balance: Cents },
    /// The order had already been recharged. Nothing changed.
    AlreadyRecharged(Order),
}

impl CallbackResult {
    pub fn order(&self) -> &Order {
        match self {
            CallbackResult::Recharged { order, .. } => order,
            CallbackResult::AlreadyRecharged(order) => order,
        }
    }
}
