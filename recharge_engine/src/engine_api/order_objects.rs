use chrono::{DateTime, Utc};
use rpg_common::Cents;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, OrderStatusType};

/// The result of [`OrderFlowApi::transition`](crate::OrderFlowApi::transition).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// The order moved to the new status.
    Applied(Order),
    /// The order was already in the requested status. Nothing changed.
    Unchanged(Order),
}

impl TransitionResult {
    pub fn order(&self) -> &Order {
        match self {
            TransitionResult::Applied(o) | TransitionResult::Unchanged(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            TransitionResult::Applied(o) | TransitionResult::Unchanged(o) => o,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionResult::Applied(_))
    }
}

/// The result of a compare-and-set on an order's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResult {
    /// The order was in the expected status and has moved on. The caller owns the side effects of the move.
    Claimed(Order),
    /// The order was not in the expected status. It is returned as found.
    Lost(Order),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusSnapshot {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub amount: Cents,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderStatusSnapshot {
    fn from(order: Order) -> Self {
        Self { order_id: order.id, status: order.status, amount: order.amount, updated_at: order.updated_at }
    }
}
