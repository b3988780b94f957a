use recharge_engine::{db_types::OrderId, payment_objects::PaymentParams};
use rpg_common::Cents;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/place_order`. The recipient defaults to the paying account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub account: String,
    pub amount: Cents,
    #[serde(default)]
    pub recipient: Option<String>,
}

/// Body of `POST /api/pay`.
///
/// Any fields besides `order_id` and `method` are handed to the payment strategy. An `amount`, if present, must match
/// the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRequest {
    pub order_id: OrderId,
    pub method: String,
    #[serde(flatten)]
    pub params: PaymentParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorRequest {
    pub order_id: OrderId,
    pub amount: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountQuery {
    pub account: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderQuery {
    pub order_id: OrderId,
}
