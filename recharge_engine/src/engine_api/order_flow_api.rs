use std::fmt::Debug;

use chrono::Utc;
use log::*;
use rpg_common::Cents;

use crate::{
    db_types::{AccountId, NewOrder, Order, OrderId, OrderStatusType},
    engine_api::order_objects::{ClaimResult, OrderStatusSnapshot, TransitionResult},
    events::{EventProducers, OrderFailedEvent, OrderPaidEvent, OrderRechargedEvent},
    traits::{LedgerStore, PaymentGatewayError},
};

/// `OrderFlowApi` owns the order state machine.
///
/// ```text
///   pending ──► paid ──► recharged
///      │          │
///      └──► failed ◄┘
/// ```
///
/// Every status change is a single atomic update in the ledger, so concurrent callers always see a consistent order,
/// and exactly one of them wins any given edge.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone> Clone for OrderFlowApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub(crate) fn producers(&self) -> &EventProducers {
        &self.producers
    }
}

impl<B> OrderFlowApi<B>
where B: LedgerStore
{
    /// Creates a new `pending` order that will recharge the paying account itself.
    ///
    /// Fails with `InvalidAccount` if `account` is not a valid account id, and with `InvalidAmount` unless `amount` is
    /// positive. The payer's balance is not checked here; that happens when the order is paid.
    pub async fn create_order(&self, account: &str, amount: Cents) -> Result<Order, PaymentGatewayError> {
        let account = account.parse::<AccountId>()?;
        self.insert(NewOrder::new(account, amount)).await
    }

    /// Creates a new `pending` order paid for by `account` that recharges `recipient`.
    pub async fn create_order_for(
        &self,
        account: &str,
        recipient: &str,
        amount: Cents,
    ) -> Result<Order, PaymentGatewayError> {
        let account = account.parse::<AccountId>()?;
        let recipient = recipient.parse::<AccountId>()?;
        self.insert(NewOrder::with_recipient(account, recipient, amount)).await
    }

    async fn insert(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        if !order.amount.is_positive() {
            return Err(PaymentGatewayError::InvalidAmount(format!("Order amounts must be positive, not {}", order.amount)));
        }
        let order = self.db.insert_order(order).await?;
        info!("🔄️📦️ Order [{}] created: {} for {} (recipient {})", order.id, order.amount, order.account, order.recipient);
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))
    }

    pub async fn check_order_status(&self, order_id: &OrderId) -> Result<OrderStatusSnapshot, PaymentGatewayError> {
        self.fetch_order(order_id).await.map(OrderStatusSnapshot::from)
    }

    /// Changes the status of an order.
    ///
    /// | From \ To | pending   | paid      | failed    | recharged |
    /// |-----------|-----------|-----------|-----------|-----------|
    /// | pending   | Unchanged | Applied   | Applied   | Err       |
    /// | paid      | Err       | Unchanged | Applied   | Applied   |
    /// | failed    | Err       | Err       | Unchanged | Err       |
    /// | recharged | Err       | Err       | Err       | Unchanged |
    ///
    /// Errors are `IllegalTransition`, and leave the order untouched. Applied transitions stamp `paid_at` or
    /// `recharged_at` as appropriate.
    ///
    /// This is the raw state machine. It does not move money: use the payment and recharge APIs for that.
    /// Applied transitions publish the same events as those APIs. The recharged event carries the recipient's current
    /// balance, which has not been credited.
    pub async fn transition(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<TransitionResult, PaymentGatewayError> {
        let (order, applied) = self.db.update_order(order_id, |o| Ok(o.advance(new_status, Utc::now())?)).await?;
        if !applied {
            trace!("🔄️ Order [{order_id}] is already {new_status}");
            return Ok(TransitionResult::Unchanged(order));
        }
        info!("🔄️ Order [{order_id}] is now {new_status}");
        match new_status {
            OrderStatusType::Paid => self.producers.publish_order_paid(OrderPaidEvent::new(order.clone(), None)).await,
            OrderStatusType::Failed => {
                let event = OrderFailedEvent::new(order.clone(), "Status changed manually");
                self.producers.publish_order_failed(event).await
            },
            OrderStatusType::Recharged => match self.db.fetch_account(&order.recipient).await {
                Ok(account) => {
                    let event = OrderRechargedEvent::new(order.clone(), account.balance);
                    self.producers.publish_order_recharged(event).await
                },
                Err(e) => error!("🔄️ Order [{order_id}] is recharged, but {} could not be fetched. {e}", order.recipient),
            },
            OrderStatusType::Pending => {},
        }
        Ok(TransitionResult::Applied(order))
    }

    /// Moves the order from `from` to `to`, but only if it is currently in `from`.
    ///
    /// `transaction_id`, if given, is recorded on the order as part of the same update.
    pub(crate) async fn claim(
        &self,
        order_id: &OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
        transaction_id: Option<String>,
    ) -> Result<ClaimResult, PaymentGatewayError> {
        let (order, claimed) = self
            .db
            .update_order(order_id, move |o| {
                if o.status != from {
                    return Ok(false);
                }
                o.advance(to, Utc::now())?;
                if let Some(txid) = transaction_id {
                    o.transaction_id = Some(txid);
                }
                Ok(true)
            })
            .await?;
        if claimed {
            debug!("🔄️ Order [{order_id}] moved from {from} to {to}");
            Ok(ClaimResult::Claimed(order))
        } else {
            debug!("🔄️ Order [{order_id}] could not move from {from} to {to}. It is {}", order.status);
            Ok(ClaimResult::Lost(order))
        }
    }

    /// Puts a recharged order back to `paid` after its credit failed to commit.
    pub(crate) async fn revert_recharge(&self, order_id: &OrderId) -> Result<Order, PaymentGatewayError> {
        let (order, reverted) = self.db.update_order(order_id, |o| Ok(o.revert_recharge(Utc::now()))).await?;
        if reverted {
            warn!("🔄️ Recharge of order [{order_id}] has been reverted. The order is paid again.");
        }
        Ok(order)
    }
}
