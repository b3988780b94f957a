use std::fmt::Debug;

use log::*;
use rpg_common::Cents;

use crate::{
    db_types::{Order, OrderId, OrderStatusType},
    engine_api::{
        balance_guard::BalanceGuard,
        order_flow_api::OrderFlowApi,
        order_objects::ClaimResult,
        payment_objects::{
            PaymentDescriptor,
            PaymentOutcome,
            PaymentParams,
            PaymentRequest,
            PaymentResult,
            PaymentStatusReport,
            RefundReceipt,
            StrategyResult,
        },
    },
    events::{EventProducers, OrderFailedEvent, OrderPaidEvent},
    payment::{FailedPaymentPolicy, Funding, PaymentMethod, PaymentProcessor},
    traits::{LedgerStore, PaymentGatewayError, PaymentStrategy},
};

/// `PaymentApi` takes payments for pending orders.
///
/// The strategy registered for the chosen method settles the payment. This API then applies the outcome to the ledger:
/// the order is claimed `pending → paid` first, and only the claimant debits the payer. If that debit is refused, the
/// order is rolled back to `failed` and the strategy is asked to refund the payment.
pub struct PaymentApi<B> {
    orders: OrderFlowApi<B>,
    guard: BalanceGuard<B>,
    processor: PaymentProcessor,
}

impl<B> Debug for PaymentApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentApi ({:?})", self.processor)
    }
}

impl<B: Clone> Clone for PaymentApi<B> {
    fn clone(&self) -> Self {
        Self { orders: self.orders.clone(), guard: self.guard.clone(), processor: self.processor.clone() }
    }
}

impl<B> PaymentApi<B>
where B: LedgerStore
{
    pub fn new(db: B, processor: PaymentProcessor, producers: EventProducers) -> Self {
        let guard = BalanceGuard::new(db.clone());
        let orders = OrderFlowApi::new(db, producers);
        Self { orders, guard, processor }
    }

    pub fn db(&self) -> &B {
        self.orders.db()
    }

    pub fn processor(&self) -> &PaymentProcessor {
        &self.processor
    }

    /// Pays for a `pending` order with the given method.
    ///
    /// Balance-funded methods settle immediately and return [`PaymentResult::Paid`] or [`PaymentResult::Declined`].
    /// QR code payments return [`PaymentResult::AwaitingConfirmation`] and the order stays `pending` until the gateway
    /// calls back.
    ///
    /// Nothing is mutated if the order is not payable, the supplied amount does not match, the payer cannot cover the
    /// amount, or the gateway does not answer in time.
    pub async fn process_payment(
        &self,
        order_id: &OrderId,
        method: PaymentMethod,
        params: PaymentParams,
    ) -> Result<PaymentResult, PaymentGatewayError> {
        let strategy = self.processor.strategy(method)?;
        let order = self.orders.fetch_order(order_id).await?;
        if let Some(amount) = params.amount {
            if amount != order.amount {
                warn!("💳️ Payment of {amount} for order [{order_id}] does not match the order amount of {}", order.amount);
                return Err(PaymentGatewayError::InvalidAmount(format!(
                    "Order {order_id} is for {}, not {amount}",
                    order.amount
                )));
            }
        }
        if order.status != OrderStatusType::Pending {
            info!("💳️ Order [{order_id}] is {} and cannot be paid", order.status);
            return Err(PaymentGatewayError::OrderNotPayable { order_id: order_id.clone(), status: order.status });
        }
        if strategy.funding() == Funding::Balance {
            self.guard.verify_funds(&order.account, order.amount).await?;
        }
        let request = PaymentRequest::for_order(&order, params.extra);
        let result = self.processor.with_timeout(strategy.process(&request)).await.map_err(|e| {
            warn!("💳️ {method} payment for order [{order_id}] could not be processed. {e}");
            e
        })?;
        match result {
            StrategyResult::Initiated(descriptor) => {
                info!("💳️ {method} payment for order [{order_id}] initiated. Awaiting confirmation from the gateway.");
                Ok(PaymentResult::AwaitingConfirmation(descriptor))
            },
            StrategyResult::Completed(outcome) if outcome.is_success() => {
                self.apply_successful_payment(strategy.as_ref(), &order, outcome).await
            },
            StrategyResult::Completed(outcome) => self.apply_declined_payment(order, outcome).await,
        }
    }

    async fn apply_successful_payment(
        &self,
        strategy: &dyn PaymentStrategy,
        order: &Order,
        outcome: PaymentOutcome,
    ) -> Result<PaymentResult, PaymentGatewayError> {
        let order_id = &order.id;
        let method = outcome.method;
        let txid = outcome.transaction_id.clone();
        let claim =
            self.orders.claim(order_id, OrderStatusType::Pending, OrderStatusType::Paid, Some(txid.clone())).await?;
        let paid = match claim {
            ClaimResult::Claimed(paid) => paid,
            ClaimResult::Lost(found) => {
                warn!(
                    "💳️ {method} payment {txid} for order [{order_id}] succeeded, but the order is already {}. \
                     Refunding the payment.",
                    found.status
                );
                self.compensate(strategy, order_id, order.amount).await;
                return Err(PaymentGatewayError::OrderNotPayable { order_id: order_id.clone(), status: found.status });
            },
        };
        if strategy.funding() == Funding::Balance {
            if let Err(e) = self.guard.debit(&paid.account, paid.amount).await {
                warn!("💳️ Could not debit {} for order [{order_id}]. {e}. Rolling the order back.", paid.account);
                self.roll_back(strategy, &paid, &e).await;
                return Err(e);
            }
        }
        info!("💳️ {method} payment {txid} for order [{order_id}] succeeded. {} has been paid.", paid.amount);
        self.orders.producers().publish_order_paid(OrderPaidEvent::new(paid.clone(), Some(method))).await;
        Ok(PaymentResult::Paid { order: paid, outcome })
    }

    async fn apply_declined_payment(
        &self,
        order: Order,
        outcome: PaymentOutcome,
    ) -> Result<PaymentResult, PaymentGatewayError> {
        let order_id = &order.id;
        let method = outcome.method;
        info!("💳️ {method} payment {} for order [{order_id}] was declined", outcome.transaction_id);
        let order = match self.processor.failed_payment_policy() {
            FailedPaymentPolicy::KeepPending => order,
            FailedPaymentPolicy::MarkFailed => {
                match self.orders.claim(order_id, OrderStatusType::Pending, OrderStatusType::Failed, None).await? {
                    ClaimResult::Claimed(failed) => {
                        let event = OrderFailedEvent::new(failed.clone(), format!("{method} payment was declined"));
                        self.orders.producers().publish_order_failed(event).await;
                        failed
                    },
                    ClaimResult::Lost(found) => found,
                }
            },
        };
        Ok(PaymentResult::Declined { order, outcome })
    }

    /// Moves a paid order whose debit failed to `failed`, and returns the payment through the strategy.
    async fn roll_back(&self, strategy: &dyn PaymentStrategy, paid: &Order, cause: &PaymentGatewayError) {
        let order_id = &paid.id;
        match self.orders.claim(order_id, OrderStatusType::Paid, OrderStatusType::Failed, None).await {
            Ok(ClaimResult::Claimed(failed)) => {
                let event = OrderFailedEvent::new(failed, cause.to_string());
                self.orders.producers().publish_order_failed(event).await;
            },
            Ok(ClaimResult::Lost(found)) => {
                error!("💳️ Order [{order_id}] could not be rolled back. It is unexpectedly {}", found.status);
            },
            Err(e) => error!("💳️ Order [{order_id}] could not be rolled back. {e}"),
        }
        self.compensate(strategy, order_id, paid.amount).await;
    }

    async fn compensate(&self, strategy: &dyn PaymentStrategy, order_id: &OrderId, amount: Cents) {
        match self.processor.with_timeout(strategy.refund(order_id, amount)).await {
            Ok(receipt) => {
                info!("💳️ Compensating refund {} of {amount} issued for order [{order_id}]", receipt.refund_id)
            },
            Err(e) => error!("💳️ Compensating refund of {amount} for order [{order_id}] failed. {e}"),
        }
    }

    /// Builds the payment link and QR code for an order.
    ///
    /// `amount` must equal the order's amount.
    pub async fn generate_payment_descriptor(
        &self,
        order_id: &OrderId,
        amount: Cents,
    ) -> Result<PaymentDescriptor, PaymentGatewayError> {
        if !amount.is_positive() {
            return Err(PaymentGatewayError::InvalidAmount(format!("Payment amounts must be positive, not {amount}")));
        }
        let order = self.orders.fetch_order(order_id).await?;
        if order.amount != amount {
            return Err(PaymentGatewayError::InvalidAmount(format!(
                "Order {order_id} is for {}, not {amount}",
                order.amount
            )));
        }
        self.processor.descriptor(order_id, amount)
    }

    pub async fn check_payment_status(&self, order_id: &OrderId) -> Result<PaymentStatusReport, PaymentGatewayError> {
        let order = self.orders.fetch_order(order_id).await?;
        let report = self.processor.query_status(&order).await?;
        debug!("💳️ Payment status for order [{order_id}] is {}", report.status);
        Ok(report)
    }

    /// Refunds some or all of an order's payment through the gateway. The ledger is not changed.
    ///
    /// With no `amount`, the full order amount is refunded.
    pub async fn refund(&self, order_id: &OrderId, amount: Option<Cents>) -> Result<RefundReceipt, PaymentGatewayError> {
        let order = self.orders.fetch_order(order_id).await?;
        let amount = amount.unwrap_or(order.amount);
        if !amount.is_positive() || amount > order.amount {
            return Err(PaymentGatewayError::InvalidAmount(format!(
                "Refunds for order {order_id} must be between 0.01 and {}, not {amount}",
                order.amount
            )));
        }
        let receipt = self.processor.refund(order_id, amount).await?;
        info!("💳️ Refund {} of {amount} for order [{order_id}] is {:?}", receipt.refund_id, receipt.status);
        Ok(receipt)
    }
}
