use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{Order, OrderStatusType},
    engine_api::{
        balance_guard::BalanceGuard,
        order_flow_api::OrderFlowApi,
        order_objects::ClaimResult,
        payment_objects::{CallbackPayload, CallbackResult},
    },
    events::{EventProducers, OrderPaidEvent, OrderRechargedEvent},
    payment::PaymentMethod,
    traits::{CallbackVerifier, LedgerStore, PaymentGatewayError},
};

/// `RechargeApi` handles payment confirmations from the gateway and credits the recipient of each confirmed order,
/// exactly once.
///
/// The order id is the idempotency key. Whichever callback claims the order `paid → recharged` does the credit.
/// Everyone else sees the order as already recharged.
pub struct RechargeApi<B> {
    orders: OrderFlowApi<B>,
    guard: BalanceGuard<B>,
    verifier: Arc<dyn CallbackVerifier>,
}

impl<B> Debug for RechargeApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RechargeApi")
    }
}

impl<B: Clone> Clone for RechargeApi<B> {
    fn clone(&self) -> Self {
        Self { orders: self.orders.clone(), guard: self.guard.clone(), verifier: Arc::clone(&self.verifier) }
    }
}

impl<B> RechargeApi<B>
where B: LedgerStore
{
    pub fn new(db: B, verifier: Arc<dyn CallbackVerifier>, producers: EventProducers) -> Self {
        let guard = BalanceGuard::new(db.clone());
        let orders = OrderFlowApi::new(db, producers);
        Self { orders, guard, verifier }
    }

    pub fn db(&self) -> &B {
        self.orders.db()
    }

    /// Processes a payment confirmation.
    ///
    /// * Callbacks that fail verification are rejected with `InvalidSignature` before anything is read.
    /// * A `pending` order (typically a QR code payment) is first marked as paid, using the callback's transaction id.
    /// * A `paid` order is recharged without being paid again.
    /// * A `recharged` order is left alone, and the call succeeds with [`CallbackResult::AlreadyRecharged`].
    /// * A `failed` order cannot be recharged.
    ///
    /// If the credit cannot be committed, the order goes back to `paid` and the error is returned, so the gateway can
    /// retry the callback.
    pub async fn handle_callback(&self, payload: CallbackPayload) -> Result<CallbackResult, PaymentGatewayError> {
        let order_id = &payload.order_id;
        if !self.verifier.verify(&payload) {
            warn!("📞️ Rejecting callback for order [{order_id}]. The signature is invalid.");
            return Err(PaymentGatewayError::InvalidSignature(order_id.clone()));
        }
        let order = self.orders.fetch_order(order_id).await?;
        debug!("📞️ Callback received for order [{order_id}], which is {}", order.status);
        let order = match order.status {
            OrderStatusType::Recharged => return Ok(already_recharged(order)),
            OrderStatusType::Failed => return Err(not_payable(&order)),
            OrderStatusType::Paid => order,
            OrderStatusType::Pending => self.confirm_payment(&payload).await?,
        };
        if order.status != OrderStatusType::Paid {
            return match order.status {
                OrderStatusType::Recharged => Ok(already_recharged(order)),
                _ => Err(not_payable(&order)),
            };
        }
        self.recharge(order).await
    }

    /// Marks a pending order as paid. If another caller got there first, returns the order as they left it.
    async fn confirm_payment(&self, payload: &CallbackPayload) -> Result<Order, PaymentGatewayError> {
        let order_id = &payload.order_id;
        let txid = payload.transaction_id.clone().unwrap_or_else(|| PaymentMethod::QrCode.new_transaction_id());
        let claim = self.orders.claim(order_id, OrderStatusType::Pending, OrderStatusType::Paid, Some(txid)).await?;
        match claim {
            ClaimResult::Claimed(paid) => {
                info!("📞️ Payment for order [{order_id}] confirmed by callback");
                self.orders.producers().publish_order_paid(OrderPaidEvent::new(paid.clone(), None)).await;
                Ok(paid)
            },
            ClaimResult::Lost(found) => Ok(found),
        }
    }

    async fn recharge(&self, order: Order) -> Result<CallbackResult, PaymentGatewayError> {
        let order_id = &order.id;
        let recharged =
            match self.orders.claim(order_id, OrderStatusType::Paid, OrderStatusType::Recharged, None).await? {
                ClaimResult::Claimed(recharged) => recharged,
                ClaimResult::Lost(found) if found.status == OrderStatusType::Recharged => {
                    debug!("📞️ Order [{order_id}] was recharged by a concurrent callback");
                    return Ok(already_recharged(found));
                },
                ClaimResult::Lost(found) => return Err(not_payable(&found)),
            };
        let account = match self.guard.credit(&recharged.recipient, recharged.amount).await {
            Ok(account) => account,
            Err(e) => {
                error!("📞️ Could not credit {} for order [{order_id}]. {e}", recharged.recipient);
                if let Err(revert_err) = self.orders.revert_recharge(order_id).await {
                    error!("📞️ Order [{order_id}] is recharged, but its credit failed and could not be reverted. {revert_err}");
                }
                return Err(e);
            },
        };
        info!(
            "📞️ Order [{order_id}] recharged. {} credited to {}, whose balance is now {}",
            recharged.amount, recharged.recipient, account.balance
        );
        let event = OrderRechargedEvent::new(recharged.clone(), account.balance);
        self.orders.producers().publish_order_recharged(event).await;
        Ok(CallbackResult::Recharged { order: recharged, balance: account.balance })
    }
}

fn already_recharged(order: Order) -> CallbackResult {
    info!("📞️ Order [{}] has already been recharged. Ignoring the callback.", order.id);
    CallbackResult::AlreadyRecharged(order)
}

fn not_payable(order: &Order) -> PaymentGatewayError {
    warn!("📞️ Order [{}] is {} and cannot be recharged", order.id, order.status);
    PaymentGatewayError::OrderNotPayable { order_id: order.id.clone(), status: order.status }
}
