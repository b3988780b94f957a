use std::sync::Arc;

use chrono::Utc;
use futures_util::future::BoxFuture;
use log::*;
use rpg_common::Cents;

use crate::{
    db_types::{Order, OrderId},
    engine_api::payment_objects::{
        OutcomeStatus,
        PaymentDescriptor,
        PaymentOutcome,
        PaymentRequest,
        PaymentStatusReport,
        RefundReceipt,
        RefundStatus,
        StrategyResult,
    },
    payment::{methods::short_id, PaymentMethod},
    traits::{OutcomePolicy, PaymentGateway, PaymentGatewayError, PaymentStrategy, QrEncoder},
};

//--------------------------------------      Settlement       ---------------------------------------------------------
/// Where settlement results come from.
#[derive(Clone)]
pub enum Settlement {
    /// Results are decided by an outcome policy. No money moves.
    Mock(Arc<dyn OutcomePolicy>),
    /// Results come from a real gateway. With no gateway wired in, every call is `NotImplemented`.
    Live(Option<Arc<dyn PaymentGateway>>),
}

impl Settlement {
    pub async fn charge(
        &self,
        method: PaymentMethod,
        request: &PaymentRequest,
    ) -> Result<PaymentOutcome, PaymentGatewayError> {
        match self {
            Settlement::Mock(policy) => {
                let status =
                    if policy.approve(method, request) { OutcomeStatus::Success } else { OutcomeStatus::Fail };
                Ok(PaymentOutcome::new(request.order_id.clone(), method, status))
            },
            Settlement::Live(Some(gateway)) => gateway.charge(method, request).await,
            Settlement::Live(None) => Err(PaymentGatewayError::NotImplemented(format!("Real {method} payments"))),
        }
    }

    /// In mock mode, the ledger is the source of truth, so the report mirrors the order record.
    pub async fn query_status(&self, order: &Order) -> Result<PaymentStatusReport, PaymentGatewayError> {
        match self {
            Settlement::Mock(_) => Ok(PaymentStatusReport {
                order_id: order.id.clone(),
                status: order.status,
                transaction_id: order.transaction_id.clone().unwrap_or_else(|| short_id("txn_")),
                last_checked: Utc::now(),
            }),
            Settlement::Live(Some(gateway)) => gateway.query_status(order).await,
            Settlement::Live(None) => {
                Err(PaymentGatewayError::NotImplemented("Real payment status queries".to_string()))
            },
        }
    }

    pub async fn refund(&self, order_id: &OrderId, amount: Cents) -> Result<RefundReceipt, PaymentGatewayError> {
        match self {
            Settlement::Mock(_) => {
                let receipt = RefundReceipt {
                    order_id: order_id.clone(),
                    refund_id: short_id("ref_"),
                    amount,
                    status: RefundStatus::Refunded,
                    timestamp: Utc::now(),
                };
                debug!("💳️ Mock refund {} of {amount} issued for order [{order_id}]", receipt.refund_id);
                Ok(receipt)
            },
            Settlement::Live(Some(gateway)) => gateway.refund(order_id, amount).await,
            Settlement::Live(None) => Err(PaymentGatewayError::NotImplemented("Real refunds".to_string())),
        }
    }
}

//--------------------------------------   DescriptorBuilder    ---------------------------------------------------------
/// Builds payment-initiation descriptors: a gateway link for the order, and its QR code.
#[derive(Clone)]
pub struct DescriptorBuilder {
    base_url: String,
    encoder: Arc<dyn QrEncoder>,
}

impl DescriptorBuilder {
    pub fn new<S: Into<String>>(base_url: S, encoder: Arc<dyn QrEncoder>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, encoder }
    }

    pub fn destination_url(&self, order_id: &OrderId, amount: Cents) -> String {
        format!("{}/pay?order_id={order_id}&amount={amount}", self.base_url)
    }

    pub fn build(&self, order_id: &OrderId, amount: Cents) -> Result<PaymentDescriptor, PaymentGatewayError> {
        let destination_url = self.destination_url(order_id, amount);
        let encoded_image = self.encoder.encode(&destination_url)?;
        Ok(PaymentDescriptor { order_id: order_id.clone(), amount, destination_url, encoded_image })
    }
}

//--------------------------------------     DirectPayment     ---------------------------------------------------------
/// Pays straight out of the payer's balance.
pub struct DirectPayment {
    settlement: Settlement,
}

impl DirectPayment {
    pub fn new(settlement: Settlement) -> Self {
        Self { settlement }
    }
}

impl PaymentStrategy for DirectPayment {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::Direct
    }

    fn process<'a>(&'a self, request: &'a PaymentRequest) -> BoxFuture<'a, Result<StrategyResult, PaymentGatewayError>> {
        Box::pin(async move {
            let outcome = self.settlement.charge(PaymentMethod::Direct, request).await?;
            Ok(StrategyResult::Completed(outcome))
        })
    }

    fn refund<'a>(
        &'a self,
        order_id: &'a OrderId,
        amount: Cents,
    ) -> BoxFuture<'a, Result<RefundReceipt, PaymentGatewayError>> {
        Box::pin(self.settlement.refund(order_id, amount))
    }
}

//--------------------------------------     WalletPayment     ---------------------------------------------------------
/// Pays through a third-party wallet provider (WeChat Pay or Alipay).
pub struct WalletPayment {
    provider: PaymentMethod,
    settlement: Settlement,
}

impl WalletPayment {
    pub fn wechat(settlement: Settlement) -> Self {
        Self { provider: PaymentMethod::Wechat, settlement }
    }

    pub fn alipay(settlement: Settlement) -> Self {
        Self { provider: PaymentMethod::Alipay, settlement }
    }
}

impl PaymentStrategy for WalletPayment {
    fn method(&self) -> PaymentMethod {
        self.provider
    }

    fn process<'a>(&'a self, request: &'a PaymentRequest) -> BoxFuture<'a, Result<StrategyResult, PaymentGatewayError>> {
        Box::pin(async move {
            trace!("💳️ Sending order [{}] to {}", request.order_id, self.provider);
            let outcome = self.settlement.charge(self.provider, request).await?;
            Ok(StrategyResult::Completed(outcome))
        })
    }

    fn refund<'a>(
        &'a self,
        order_id: &'a OrderId,
        amount: Cents,
    ) -> BoxFuture<'a, Result<RefundReceipt, PaymentGatewayError>> {
        Box::pin(self.settlement.refund(order_id, amount))
    }
}

//--------------------------------------     QrCodePayment     ---------------------------------------------------------
/// Hands the payer a QR code to pay with outside the gateway. The order is confirmed later by callback.
pub struct QrCodePayment {
    descriptors: DescriptorBuilder,
    settlement: Settlement,
}

impl QrCodePayment {
    pub fn new(descriptors: DescriptorBuilder, settlement: Settlement) -> Self {
        Self { descriptors, settlement }
    }
}

impl PaymentStrategy for QrCodePayment {
    fn method(&self) -> PaymentMethod {
        PaymentMethod::QrCode
    }

    fn process<'a>(&'a self, request: &'a PaymentRequest) -> BoxFuture<'a, Result<StrategyResult, PaymentGatewayError>> {
        Box::pin(async move {
            let descriptor = self.descriptors.build(&request.order_id, request.amount)?;
            Ok(StrategyResult::Initiated(descriptor))
        })
    }

    fn refund<'a>(
        &'a self,
        order_id: &'a OrderId,
        amount: Cents,
    ) -> BoxFuture<'a, Result<RefundReceipt, PaymentGatewayError>> {
        Box::pin(self.settlement.refund(order_id, amount))
    }
}
