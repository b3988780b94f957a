use rpg_common::Cents;
use serde::{Deserialize, Serialize};

use crate::{db_types::Order, payment::PaymentMethod};

/// An order moved from `pending` to `paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    /// `None` when the payment was confirmed by callback rather than processed here
    pub method: Option<PaymentMethod>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, method: Option<PaymentMethod>) -> Self {
        Self { order, method }
    }
}

/// An order moved to `recharged`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRechargedEvent {
    pub order: Order,
    /// The recipient's balance straight after the credit. For a manual transition, the balance at that moment
    pub balance: Cents,
}

impl OrderRechargedEvent {
    pub fn new(order: Order, balance: Cents) -> Self {
        Self { order, balance }
    }
}

/// An order moved to `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFailedEvent {
    pub order: Order,
    pub reason: String,
}

impl OrderFailedEvent {
    pub fn new<S: Into<String>>(order: Order, reason: S) -> Self {
        Self { order, reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    OrderRecharged(OrderRechargedEvent),
    OrderFailed(OrderFailedEvent),
}
