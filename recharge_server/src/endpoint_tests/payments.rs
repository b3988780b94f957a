use std::sync::Arc;

use actix_web::http::StatusCode;
use recharge_engine::{payment::AlwaysDecline, InMemoryLedger};
use serde_json::json;

use super::helpers::{
    approving_state,
    balance_of,
    get,
    place_order,
    post,
    seed,
    send_json,
    test_state,
    ALICE,
    API_SECRET,
    BOB,
};

#[actix_web::test]
async fn direct_payment_debits_the_payer() {
    let _ = env_logger::try_init().ok();
    let (db, state) = approving_state();
    seed(&db, ALICE, 100).await;
    let id = place_order(&state, ALICE, 40).await;
    let (status, result) = send_json(&state, post("/api/pay", json!({ "order_id": id, "method": "direct" }))).await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["type"], "paid");
    assert_eq!(result["data"]["order"]["status"], "paid");
    assert_eq!(result["data"]["outcome"]["status"], "success");
    assert!(result["data"]["outcome"]["transaction_id"].as_str().unwrap().starts_with("txn_"));
    assert_eq!(balance_of(&state, ALICE).await, 60.0);
}

#[actix_web::test]
async fn wallet_payment_with_matching_amount() {
    let _ = env_logger::try_init().ok();
    let (db, state) = approving_state();
    seed(&db, ALICE, 50).await;
    let id = place_order(&state, ALICE, 20).await;
    let body = json!({ "order_id": id, "method": "wechat", "amount": 20 });
    let (status, result) = send_json(&state, post("/api/pay", body)).await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert!(result["data"]["outcome"]["transaction_id"].as_str().unwrap().starts_with("wx_"));
    assert_eq!(balance_of(&state, ALICE).await, 30.0);
}

#[actix_web::test]
async fn payment_amount_must_match_the_order() {
    let _ = env_logger::try_init().ok();
    let (db, state) = approving_state();
    seed(&db, ALICE, 50).await;
    let id = place_order(&state, ALICE, 20).await;
    let body = json!({ "order_id": id, "method": "alipay", "amount": 25 });
    let (status, err) = send_json(&state, post("/api/pay", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().starts_with("Invalid amount"), "{err}");
    assert_eq!(balance_of(&state, ALICE).await, 50.0);
}

#[actix_web::test]
async fn insufficient_balance() {
    let _ = env_logger::try_init().ok();
    let (db, state) = approving_state();
    seed(&db, ALICE, 10).await;
    let id = place_order(&state, ALICE, 50).await;
    let (status, err) = send_json(&state, post("/api/pay", json!({ "order_id": id, "method": "direct" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().starts_with("Insufficient balance in account 13812345678"), "{err}");
    let (_, snapshot) = send_json(&state, get(&format!("/api/order_status?order_id={id}"))).await;
    assert_eq!(snapshot["status"], "pending");
    assert_eq!(balance_of(&state, ALICE).await, 10.0);
}

#[actix_web::test]
async fn declined_payment() {
    let _ = env_logger::try_init().ok();
    let db = InMemoryLedger::new();
    let state = test_state(db.clone(), Arc::new(AlwaysDecline));
    seed(&db, ALICE, 100).await;
    let id = place_order(&state, ALICE, 40).await;
    let (status, result) = send_json(&state, post("/api/pay", json!({ "order_id": id, "method": "direct" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(result["type"], "declined");
    assert_eq!(result["data"]["outcome"]["status"], "fail");
    assert_eq!(result["data"]["order"]["status"], "pending");
    assert_eq!(balance_of(&state, ALICE).await, 100.0);
}

#[actix_web::test]
async fn unsupported_payment_method() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let id = place_order(&state, ALICE, 40).await;
    let (status, err) = send_json(&state, post("/api/pay", json!({ "order_id": id, "method": "paypal" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "Unsupported payment method: paypal");
}

#[actix_web::test]
async fn paid_orders_cannot_be_paid_again() {
    let _ = env_logger::try_init().ok();
    let (db, state) = approving_state();
    seed(&db, ALICE, 100).await;
    let id = place_order(&state, ALICE, 40).await;
    let (status, _) = send_json(&state, post("/api/pay", json!({ "order_id": id, "method": "direct" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, err) = send_json(&state, post("/api/pay", json!({ "order_id": id, "method": "direct" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], format!("Order {id} cannot be paid, since it is paid"));
    assert_eq!(balance_of(&state, ALICE).await, 60.0);
}

#[actix_web::test]
async fn paying_an_unknown_order() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let (status, _) = send_json(&state, post("/api/pay", json!({ "order_id": "nope", "method": "direct" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn qr_payment_is_completed_by_callback() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let body = json!({ "account": ALICE, "amount": 40, "recipient": BOB });
    let (_, order) = send_json(&state, post("/api/place_order", body)).await;
    let id = order["id"].as_str().unwrap().to_string();

    let (status, result) = send_json(&state, post("/api/pay", json!({ "order_id": id, "method": "qr_code" }))).await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["type"], "awaiting_confirmation");
    assert!(result["data"]["destination_url"].as_str().unwrap().contains(id.as_str()));
    assert!(result["data"]["encoded_image"].as_str().unwrap().starts_with("data:image/svg+xml;base64,"));

    let callback = json!({ "order_id": id, "signature": API_SECRET, "transaction_id": "qr_12345678" });
    let (status, result) = send_json(&state, post("/api/payment_callback", callback.clone())).await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["type"], "recharged");
    assert_eq!(result["data"]["order"]["status"], "recharged");
    assert_eq!(result["data"]["order"]["transaction_id"], "qr_12345678");
    assert_eq!(result["data"]["balance"], 40.0);
    assert_eq!(balance_of(&state, BOB).await, 40.0);
    assert_eq!(balance_of(&state, ALICE).await, 0.0);

    let (status, result) = send_json(&state, post("/api/payment_callback", callback)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["type"], "already_recharged");
    assert_eq!(balance_of(&state, BOB).await, 40.0);
}

#[actix_web::test]
async fn callback_with_bad_signature() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let id = place_order(&state, ALICE, 40).await;
    let callback = json!({ "order_id": id, "signature": "forged" });
    let (status, err) = send_json(&state, post("/api/payment_callback", callback)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["error"], format!("The callback signature for order {id} is invalid"));
    let (_, snapshot) = send_json(&state, get(&format!("/api/order_status?order_id={id}"))).await;
    assert_eq!(snapshot["status"], "pending");
    assert_eq!(balance_of(&state, ALICE).await, 0.0);
}

#[actix_web::test]
async fn callback_for_unknown_order() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let callback = json!({ "order_id": "missing", "signature": API_SECRET });
    let (status, _) = send_json(&state, post("/api/payment_callback", callback)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn payment_descriptor() {
    let _ = env_logger::try_init().ok();
    let (_, state) = approving_state();
    let id = place_order(&state, ALICE, 40).await;
    let (status, descriptor) =
        send_json(&state, post("/api/payment_descriptor", json!({ "order_id": id, "amount": 40 }))).await;
    assert_eq!(status, StatusCode::OK, "{descriptor}");
    assert_eq!(descriptor["order_id"], id.as_str());
    assert_eq!(descriptor["amount"], 40.0);
    assert!(descriptor["destination_url"].as_str().unwrap().starts_with("https://mock-payment-gateway.com"));

    let (status, _) = send_json(&state, post("/api/payment_descriptor", json!({ "order_id": id, "amount": 41 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send_json(&state, post("/api/payment_descriptor", json!({ "order_id": id, "amount": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn payment_status() {
    let _ = env_logger::try_init().ok();
    let (db, state) = approving_state();
    seed(&db, ALICE, 100).await;
    let id = place_order(&state, ALICE, 40).await;
    let (_, paid) = send_json(&state, post("/api/pay", json!({ "order_id": id, "method": "direct" }))).await;
    let (status, report) = send_json(&state, get(&format!("/api/payment_status?order_id={id}"))).await;
    assert_eq!(status, StatusCode::OK, "{report}");
    assert_eq!(report["order_id"], id.as_str());
    assert_eq!(report["status"], "paid");
    assert_eq!(report["transaction_id"], paid["data"]["outcome"]["transaction_id"]);

    let (status, _) = send_json(&state, get("/api/payment_status?order_id=missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
