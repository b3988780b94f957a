use std::{collections::HashMap, fmt::Debug, future::Future, sync::Arc, time::Duration};

use log::*;
use rpg_common::Cents;

use crate::{
    db_types::{Order, OrderId},
    engine_api::payment_objects::{PaymentDescriptor, PaymentStatusReport, RefundReceipt},
    helpers::SvgQrEncoder,
    payment::{
        config::{FailedPaymentPolicy, PaymentConfig},
        policies::RandomApproval,
        strategies::{DescriptorBuilder, DirectPayment, QrCodePayment, Settlement, WalletPayment},
        PaymentMethod,
    },
    traits::{OutcomePolicy, PaymentGateway, PaymentGatewayError, PaymentStrategy},
};

/// The registry of payment strategies, plus the settings that govern every payment attempt.
///
/// Cloning is cheap. Strategies are shared.
#[derive(Clone)]
pub struct PaymentProcessor {
    strategies: HashMap<PaymentMethod, Arc<dyn PaymentStrategy>>,
    settlement: Settlement,
    descriptors: DescriptorBuilder,
    timeout: Duration,
    failed_payment_policy: FailedPaymentPolicy,
}

impl Debug for PaymentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut methods = self.strategies.keys().map(|m| m.to_string()).collect::<Vec<_>>();
        methods.sort();
        write!(f, "PaymentProcessor [{}]", methods.join(", "))
    }
}

impl PaymentProcessor {
    /// An empty processor. Register strategies with [`Self::register`].
    pub fn new(settlement: Settlement, descriptors: DescriptorBuilder, timeout: Duration) -> Self {
        Self {
            strategies: HashMap::new(),
            settlement,
            descriptors,
            timeout,
            failed_payment_policy: FailedPaymentPolicy::default(),
        }
    }

    /// A processor with all four payment methods registered.
    ///
    /// In mock mode every strategy settles through `policy`, or a [`RandomApproval`] at the configured success rate
    /// if no policy is given. Otherwise they delegate to `gateway`.
    pub fn from_config(
        config: &PaymentConfig,
        policy: Option<Arc<dyn OutcomePolicy>>,
        gateway: Option<Arc<dyn PaymentGateway>>,
    ) -> Self {
        let settlement = if config.mock_mode {
            let policy = policy.unwrap_or_else(|| {
                Arc::new(RandomApproval::new(config.mock_success_rate)) as Arc<dyn OutcomePolicy>
            });
            Settlement::Mock(policy)
        } else {
            Settlement::Live(gateway)
        };
        let descriptors = DescriptorBuilder::new(config.gateway_base_url.clone(), Arc::new(SvgQrEncoder::default()));
        let mut processor = Self::new(settlement.clone(), descriptors.clone(), config.gateway_timeout)
            .with_failed_payment_policy(config.failed_payment_policy);
        processor
            .register(Arc::new(DirectPayment::new(settlement.clone())))
            .register(Arc::new(WalletPayment::wechat(settlement.clone())))
            .register(Arc::new(WalletPayment::alipay(settlement.clone())))
            .register(Arc::new(QrCodePayment::new(descriptors, settlement)));
        processor
    }

    pub fn with_failed_payment_policy(mut self, policy: FailedPaymentPolicy) -> Self {
        self.failed_payment_policy = policy;
        self
    }

    /// Adds a strategy, replacing any strategy already registered for the same method.
    pub fn register(&mut self, strategy: Arc<dyn PaymentStrategy>) -> &mut Self {
        let method = strategy.method();
        if self.strategies.insert(method, strategy).is_some() {
            debug!("💳️ Replaced the {method} payment strategy");
        } else {
            debug!("💳️ Registered the {method} payment strategy");
        }
        self
    }

    pub fn strategy(&self, method: PaymentMethod) -> Result<Arc<dyn PaymentStrategy>, PaymentGatewayError> {
        self.strategies.get(&method).cloned().ok_or_else(|| {
            warn!("💳️ No strategy is registered for {method} payments");
            PaymentGatewayError::UnsupportedMethod(method.to_string())
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn failed_payment_policy(&self) -> FailedPaymentPolicy {
        self.failed_payment_policy
    }

    pub fn descriptor(&self, order_id: &OrderId, amount: Cents) -> Result<PaymentDescriptor, PaymentGatewayError> {
        self.descriptors.build(order_id, amount)
    }

    pub async fn query_status(&self, order: &Order) -> Result<PaymentStatusReport, PaymentGatewayError> {
        self.with_timeout(self.settlement.query_status(order)).await
    }

    pub async fn refund(&self, order_id: &OrderId, amount: Cents) -> Result<RefundReceipt, PaymentGatewayError> {
        self.with_timeout(self.settlement.refund(order_id, amount)).await
    }

    /// Runs a gateway call under the configured timeout. Expiry is reported as `GatewayUnavailable`.
    pub async fn with_timeout<F, T>(&self, call: F) -> Result<T, PaymentGatewayError>
    where F: Future<Output = Result<T, PaymentGatewayError>> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!("💳️ Payment gateway did not respond within {}ms", self.timeout.as_millis());
                Err(PaymentGatewayError::GatewayUnavailable(format!(
                    "No response within {}ms",
                    self.timeout.as_millis()
                )))
            },
        }
    }
}
