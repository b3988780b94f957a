use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use cucumber::World;
use log::*;
use recharge_engine::{
    db_types::OrderId,
    events::EventProducers,
    payment::{PaymentConfig, PaymentMethod, PaymentProcessor},
    payment_objects::{CallbackResult, PaymentRequest, PaymentResult},
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    traits::OutcomePolicy,
    AccountApi,
    OrderFlowApi,
    PaymentApi,
    PaymentGatewayError,
    RechargeApi,
    SqliteLedger,
};

pub const API_SECRET: &str = "your-secret-key";

#[derive(Default, Debug, World)]
pub struct RechargeWorld {
    pub system: Option<RechargeSystem>,
    /// Order ids by the alias used in the feature files
    pub orders: HashMap<String, OrderId>,
    pub last_payment: Option<Result<PaymentResult, PaymentGatewayError>>,
    pub last_callback: Option<Result<CallbackResult, PaymentGatewayError>>,
    pub last_error: Option<PaymentGatewayError>,
}

/// An outcome policy that the scenarios can flip between approving and declining.
#[derive(Debug, Default)]
pub struct GatewaySwitch {
    decline: AtomicBool,
}

impl GatewaySwitch {
    pub fn set_declining(&self, decline: bool) {
        self.decline.store(decline, Ordering::SeqCst);
    }
}

impl OutcomePolicy for GatewaySwitch {
    fn approve(&self, _method: PaymentMethod, _request: &PaymentRequest) -> bool {
        !self.decline.load(Ordering::SeqCst)
    }
}

pub struct RechargeSystem {
    pub db_path: String,
    pub db: SqliteLedger,
    pub switch: Arc<GatewaySwitch>,
    pub orders: OrderFlowApi<SqliteLedger>,
    pub payments: PaymentApi<SqliteLedger>,
    pub recharges: RechargeApi<SqliteLedger>,
    pub accounts: AccountApi<SqliteLedger>,
}

impl std::fmt::Debug for RechargeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RechargeSystem ({})", self.db_path)
    }
}

impl RechargeWorld {
    pub fn system(&self) -> &RechargeSystem {
        self.system.as_ref().expect("Recharge system not initialised")
    }

    pub fn order_id(&self, alias: &str) -> OrderId {
        self.orders.get(alias).cloned().unwrap_or_else(|| panic!("No order called {alias}"))
    }
}

impl RechargeSystem {
    pub async fn new(config: PaymentConfig) -> Self {
        let url = prepare_test_env().await;
        let db = SqliteLedger::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let switch = Arc::new(GatewaySwitch::default());
        let policy: Arc<dyn OutcomePolicy> = switch.clone();
        let processor = PaymentProcessor::from_config(&config, Some(policy), None);
        let producers = EventProducers::default();
        let orders = OrderFlowApi::new(db.clone(), producers.clone());
        let payments = PaymentApi::new(db.clone(), processor, producers.clone());
        let recharges = RechargeApi::new(db.clone(), config.callback_verifier(), producers);
        let accounts = AccountApi::new(db.clone());
        Self { db_path: url, db, switch, orders, payments, recharges, accounts }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
