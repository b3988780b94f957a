use actix_web::http::StatusCode;
use serde_json::json;

use super::helpers::{approving_state, balance_of, get, place_order, post, seed, send, send_json, ALICE, BOB};

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let (status, body) = send(&state, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn register_new_account() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let (status, account) = send_json(&state, post("/api/register", json!({ "account": ALICE }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["id"], ALICE);
    assert_eq!(account["balance"], 0.0);
}

#[actix_web::test]
async fn register_existing_account_keeps_balance() {
    let _ = env_logger::try_init().ok();
    let (db, state) = approving_state();
    seed(&db, ALICE, 75).await;
    let (status, account) = send_json(&state, post("/api/register", json!({ "account": ALICE }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["balance"], 75.0);
}

#[actix_web::test]
async fn register_invalid_account() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let (status, err) = send_json(&state, post("/api/register", json!({ "account": "12345" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Invalid account: '12345' is not a valid account id");
}

#[actix_web::test]
async fn check_balance() {
    let _ = env_logger::try_init().ok();
    let (db, state) = approving_state();
    seed(&db, ALICE, 100).await;
    assert_eq!(balance_of(&state, ALICE).await, 100.0);
    assert_eq!(balance_of(&state, BOB).await, 0.0);
}

#[actix_web::test]
async fn check_balance_without_account() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let (status, err) = send_json(&state, get("/api/check_balance")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().starts_with("Could not read request query"), "{err}");
}

#[actix_web::test]
async fn seeding_skips_accounts_in_use() {
    let _ = env_logger::try_init().ok();
    let (db, state) = approving_state();
    place_order(&state, ALICE, 10).await;
    seed(&db, ALICE, 100).await;
    assert_eq!(balance_of(&state, ALICE).await, 0.0);
}
