use std::sync::Arc;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use log::debug;
use recharge_engine::{
    events::EventProducers,
    payment::{AlwaysApprove, PaymentConfig, PaymentProcessor},
    traits::OutcomePolicy,
    AccountApi,
    InMemoryLedger,
};
use rpg_common::Cents;
use serde_json::Value;

use crate::{
    routes::health,
    server::{configure_routes, AppState},
};

pub const API_SECRET: &str = "endpoint-test-secret";
pub const ALICE: &str = "13812345678";
pub const BOB: &str = "13987654321";

/// A set of engine APIs over a fresh in-memory ledger, settling payments through `policy`.
pub fn test_state(db: InMemoryLedger, policy: Arc<dyn OutcomePolicy>) -> AppState<InMemoryLedger> {
    let config = PaymentConfig::default().with_api_secret(API_SECRET);
    let processor = PaymentProcessor::from_config(&config, Some(policy), None);
    AppState::new(db, processor, config.callback_verifier(), EventProducers::default())
}

pub fn approving_state() -> (InMemoryLedger, AppState<InMemoryLedger>) {
    let db = InMemoryLedger::new();
    let state = test_state(db.clone(), Arc::new(AlwaysApprove));
    (db, state)
}

pub async fn seed(db: &InMemoryLedger, account: &str, amount: i64) {
    AccountApi::new(db.clone()).seed_account(account, Cents::from_major(amount)).await.expect("Failed to seed account");
}

/// Sends the request through the full route table and returns the status and body.
pub async fn send(state: &AppState<InMemoryLedger>, req: TestRequest) -> (StatusCode, String) {
    let app = App::new()
        .configure(|cfg| state.configure(cfg))
        .service(health)
        .service(web::scope("/api").configure(configure_routes::<InMemoryLedger>));
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, body)
}

pub async fn send_json(state: &AppState<InMemoryLedger>, req: TestRequest) -> (StatusCode, Value) {
    let (status, body) = send(state, req).await;
    let json = serde_json::from_str(&body).unwrap_or_else(|e| panic!("Response was not JSON. {e}: {body}"));
    (status, json)
}

pub fn post(path: &str, body: Value) -> TestRequest {
    TestRequest::post().uri(path).set_json(body)
}

pub fn get(path: &str) -> TestRequest {
    TestRequest::get().uri(path)
}

/// Places an order through the API and returns its id.
pub async fn place_order(state: &AppState<InMemoryLedger>, account: &str, amount: i64) -> String {
    let (status, order) =
        send_json(state, post("/api/place_order", serde_json::json!({ "account": account, "amount": amount }))).await;
    assert_eq!(status, StatusCode::OK, "{order}");
    order["id"].as_str().expect("order id").to_string()
}

pub async fn balance_of(state: &AppState<InMemoryLedger>, account: &str) -> f64 {
    let (status, snapshot) = send_json(state, get(&format!("/api/check_balance?account={account}"))).await;
    assert_eq!(status, StatusCode::OK, "{snapshot}");
    snapshot["balance"].as_f64().expect("balance")
}
