use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;

use super::helpers::{approving_state, get, place_order, post, send_json, ALICE, BOB};

#[actix_web::test]
async fn place_order_for_self() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let (status, order) = send_json(&state, post("/api/place_order", json!({ "account": ALICE, "amount": 40 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["account"], ALICE);
    assert_eq!(order["recipient"], ALICE);
    assert_eq!(order["amount"], 40.0);
    assert_eq!(order["status"], "pending");
    assert!(order["transaction_id"].is_null());
    assert!(!order["id"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn place_order_for_someone_else() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let body = json!({ "account": ALICE, "amount": "12.50", "recipient": BOB });
    let (status, order) = send_json(&state, post("/api/place_order", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["account"], ALICE);
    assert_eq!(order["recipient"], BOB);
    assert_eq!(order["amount"], 12.5);
}

#[actix_web::test]
async fn order_ids_are_unique() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let first = place_order(&state, ALICE, 10).await;
    let second = place_order(&state, ALICE, 10).await;
    assert_ne!(first, second);
}

#[actix_web::test]
async fn place_order_with_bad_amounts() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    for amount in [json!(0), json!(-5)] {
        let (status, err) =
            send_json(&state, post("/api/place_order", json!({ "account": ALICE, "amount": amount }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(err["error"].as_str().unwrap().starts_with("Invalid amount"), "{err}");
    }
}

#[actix_web::test]
async fn place_order_with_bad_account() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let (status, err) =
        send_json(&state, post("/api/place_order", json!({ "account": "not-a-phone", "amount": 10 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Invalid account: 'not-a-phone' is not a valid account id");
    let body = json!({ "account": ALICE, "amount": 10, "recipient": "999" });
    let (status, _) = send_json(&state, post("/api/place_order", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn place_order_with_malformed_body() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let req = TestRequest::post()
        .uri("/api/place_order")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"account\": ");
    let (status, err) = send_json(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().starts_with("Could not read request body"), "{err}");
}

#[actix_web::test]
async fn order_status() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let id = place_order(&state, ALICE, 25).await;
    let (status, snapshot) = send_json(&state, get(&format!("/api/order_status?order_id={id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["order_id"], id.as_str());
    assert_eq!(snapshot["status"], "pending");
    assert_eq!(snapshot["amount"], 25.0);
}

#[actix_web::test]
async fn order_status_for_unknown_order() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let (status, err) = send_json(&state, get("/api/order_status?order_id=no-such-order")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "The requested order no-such-order does not exist");
}
