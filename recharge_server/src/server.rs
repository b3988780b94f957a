use std::{sync::Arc, time::Duration};

use actix_web::{
    dev::Server,
    error::{JsonPayloadError, QueryPayloadError},
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpRequest,
    HttpServer,
};
use log::*;
use recharge_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    payment::PaymentProcessor,
    traits::{CallbackVerifier, LedgerStore},
    AccountApi,
    InMemoryLedger,
    OrderFlowApi,
    PaymentApi,
    RechargeApi,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        CheckBalanceRoute,
        OrderStatusRoute,
        PayRoute,
        PaymentCallbackRoute,
        PaymentDescriptorRoute,
        PaymentStatusRoute,
        PlaceOrderRoute,
        RegisterRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 50;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, audit_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    match config.database_url.clone() {
        #[cfg(feature = "sqlite")]
        Some(url) => {
            let db = recharge_engine::SqliteLedger::new_with_url(&url, 25)
                .await
                .map_err(|e| ServerError::InitializeError(e.to_string()))?;
            info!("🚀️ Using the SQLite ledger at {url}");
            serve(config, db, producers).await
        },
        #[cfg(not(feature = "sqlite"))]
        Some(url) => {
            Err(ServerError::InitializeError(format!("{url} needs the sqlite feature. Rebuild with --features sqlite")))
        },
        None => {
            info!("🚀️ Using the in-memory ledger");
            serve(config, InMemoryLedger::new(), producers).await
        },
    }
}

async fn serve<B>(config: ServerConfig, db: B, producers: EventProducers) -> Result<(), ServerError>
where B: LedgerStore + Send + Sync + 'static {
    seed_accounts(&config, &AccountApi::new(db.clone())).await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

async fn seed_accounts<B: LedgerStore>(config: &ServerConfig, api: &AccountApi<B>) {
    for (account, amount) in &config.seed_accounts {
        if let Err(e) = api.seed_account(account, *amount).await {
            warn!("🚀️ Could not seed account {account}. {e}");
        }
    }
}

pub fn create_server_instance<B>(config: ServerConfig, db: B, producers: EventProducers) -> Result<Server, ServerError>
where B: LedgerStore + Send + Sync + 'static {
    let processor = PaymentProcessor::from_config(&config.payment, None, None);
    info!("🚀️ Payments are processed by {processor:?}. Mock mode is {}", config.payment.mock_mode);
    let verifier = config.payment.callback_verifier();
    let srv = HttpServer::new(move || {
        let state = AppState::new(db.clone(), processor.clone(), Arc::clone(&verifier), producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("rpg::access_log"))
            .configure(|cfg| state.configure(cfg))
            .service(health)
            .service(web::scope("/api").configure(configure_routes::<B>))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// The engine APIs shared by every worker.
pub struct AppState<B> {
    pub orders: OrderFlowApi<B>,
    pub payments: PaymentApi<B>,
    pub recharges: RechargeApi<B>,
    pub accounts: AccountApi<B>,
}

impl<B> AppState<B>
where B: LedgerStore + 'static
{
    pub fn new(
        db: B,
        processor: PaymentProcessor,
        verifier: Arc<dyn CallbackVerifier>,
        producers: EventProducers,
    ) -> Self {
        Self {
            orders: OrderFlowApi::new(db.clone(), producers.clone()),
            payments: PaymentApi::new(db.clone(), processor, producers.clone()),
            recharges: RechargeApi::new(db.clone(), verifier, producers),
            accounts: AccountApi::new(db),
        }
    }

    /// Registers the APIs as app data, along with the JSON and query error handlers.
    pub fn configure(&self, cfg: &mut ServiceConfig) {
        cfg.app_data(web::Data::new(self.orders.clone()))
            .app_data(web::Data::new(self.payments.clone()))
            .app_data(web::Data::new(self.recharges.clone()))
            .app_data(web::Data::new(self.accounts.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error));
    }
}

pub fn configure_routes<B: LedgerStore + 'static>(cfg: &mut ServiceConfig) {
    cfg.service(RegisterRoute::<B>::new())
        .service(CheckBalanceRoute::<B>::new())
        .service(PlaceOrderRoute::<B>::new())
        .service(OrderStatusRoute::<B>::new())
        .service(PayRoute::<B>::new())
        .service(PaymentCallbackRoute::<B>::new())
        .service(PaymentDescriptorRoute::<B>::new())
        .service(PaymentStatusRoute::<B>::new());
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting request body. {err}");
    ServerError::InvalidRequestBody(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting request query. {err}");
    ServerError::InvalidRequestQuery(err.to_string()).into()
}

/// Event hooks that write every order state change to the audit log.
pub fn audit_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_paid(|ev| {
            let method = ev.method.map(|m| m.to_string()).unwrap_or_else(|| "callback".to_string());
            info!(target: "rpg::audit", "📬️ Order [{}] paid: {} from {} via {method}", ev.order.id, ev.order.amount, ev.order.account);
            Box::pin(async {})
        })
        .on_order_recharged(|ev| {
            info!(
                target: "rpg::audit",
                "📬️ Order [{}] recharged: {} to {}. Balance is now {}",
                ev.order.id, ev.order.amount, ev.order.recipient, ev.balance
            );
            Box::pin(async {})
        })
        .on_order_failed(|ev| {
            info!(target: "rpg::audit", "📬️ Order [{}] failed: {}", ev.order.id, ev.reason);
            Box::pin(async {})
        });
    hooks
}
