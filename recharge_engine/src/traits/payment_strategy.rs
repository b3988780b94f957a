use futures_util::future::BoxFuture;
use rpg_common::Cents;

use crate::{
    db_types::{Order, OrderId},
    engine_api::payment_objects::{
        PaymentOutcome,
        PaymentRequest,
        PaymentStatusReport,
        RefundReceipt,
        StrategyResult,
    },
    payment::{Funding, PaymentMethod},
    traits::PaymentGatewayError,
};

/// A payment method implementation. Strategies are registered with the
/// [`PaymentProcessor`](crate::payment::PaymentProcessor) and looked up by [`PaymentMethod`].
///
/// Strategies only talk to the outside world. They never touch the ledger; the caller applies the outcome.
pub trait PaymentStrategy: Send + Sync {
    fn method(&self) -> PaymentMethod;

    fn funding(&self) -> Funding {
        self.method().funding()
    }

    /// Attempt to settle the request.
    fn process<'a>(&'a self, request: &'a PaymentRequest) -> BoxFuture<'a, Result<StrategyResult, PaymentGatewayError>>;

    /// Return `amount` to the payer of `order_id` through the same channel the payment came in on.
    fn refund<'a>(
        &'a self,
        order_id: &'a OrderId,
        amount: Cents,
    ) -> BoxFuture<'a, Result<RefundReceipt, PaymentGatewayError>>;
}

/// A connection to a real settlement network.
pub trait PaymentGateway: Send + Sync {
    fn charge<'a>(
        &'a self,
        method: PaymentMethod,
        request: &'a PaymentRequest,
    ) -> BoxFuture<'a, Result<PaymentOutcome, PaymentGatewayError>>;

    fn query_status<'a>(&'a self, order: &'a Order) -> BoxFuture<'a, Result<PaymentStatusReport, PaymentGatewayError>>;

    fn refund<'a>(
        &'a self,
        order_id: &'a OrderId,
        amount: Cents,
    ) -> BoxFuture<'a, Result<RefundReceipt, PaymentGatewayError>>;
}

/// Decides mock settlement results.
pub trait OutcomePolicy: Send + Sync {
    fn approve(&self, method: PaymentMethod, request: &PaymentRequest) -> bool;
}
