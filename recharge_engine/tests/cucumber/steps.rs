use cucumber::{then, when};
use futures_util::future::join;
use recharge_engine::{
    db_types::OrderStatusType,
    payment::PaymentMethod,
    payment_objects::{CallbackPayload, CallbackResult, PaymentParams, PaymentResult},
    PaymentGatewayError,
};
use rpg_common::Cents;

use crate::cucumber::{recharge_world::API_SECRET, RechargeWorld};

#[when(expr = "account {word} places order {word} for {int}")]
async fn place_order(world: &mut RechargeWorld, account: String, alias: String, amount: i64) {
    let order =
        world.system().orders.create_order(&account, Cents::from_major(amount)).await.expect("Error creating order");
    world.orders.insert(alias, order.id);
}

#[when(expr = "account {word} places order {word} for {int} on behalf of {word}")]
async fn place_order_for(world: &mut RechargeWorld, account: String, alias: String, amount: i64, recipient: String) {
    let order = world
        .system()
        .orders
        .create_order_for(&account, &recipient, Cents::from_major(amount))
        .await
        .expect("Error creating order");
    world.orders.insert(alias, order.id);
}

#[when(expr = "account {word} tries to place an order for {int}")]
async fn try_place_order(world: &mut RechargeWorld, account: String, amount: i64) {
    let result = world.system().orders.create_order(&account, Cents::from_major(amount)).await;
    world.last_error = result.err();
}

#[when(expr = "order {word} is paid with {word}")]
async fn pay_order(world: &mut RechargeWorld, alias: String, method: String) {
    let id = world.order_id(&alias);
    let method = method.parse::<PaymentMethod>().expect("Unknown payment method");
    let result = world.system().payments.process_payment(&id, method, PaymentParams::default()).await;
    world.last_error = result.as_ref().err().cloned();
    world.last_payment = Some(result);
}

#[when(expr = "orders {word} and {word} are paid with {word} at the same time")]
async fn pay_orders_concurrently(world: &mut RechargeWorld, first: String, second: String, method: String) {
    let (first, second) = (world.order_id(&first), world.order_id(&second));
    let method = method.parse::<PaymentMethod>().expect("Unknown payment method");
    let payments = &world.system().payments;
    let (a, b) = join(
        payments.process_payment(&first, method, PaymentParams::default()),
        payments.process_payment(&second, method, PaymentParams::default()),
    )
    .await;
    let paid = [&a, &b].iter().filter(|r| matches!(r, Ok(PaymentResult::Paid { .. }))).count();
    assert_eq!(paid, 1, "Exactly one payment should have succeeded");
    world.last_error = a.err().or(b.err());
}

#[when(expr = "order {word} is paid with {word} twice at the same time")]
async fn pay_order_twice(world: &mut RechargeWorld, alias: String, method: String) {
    let id = world.order_id(&alias);
    let method = method.parse::<PaymentMethod>().expect("Unknown payment method");
    let payments = &world.system().payments;
    let (a, b) = join(
        payments.process_payment(&id, method, PaymentParams::default()),
        payments.process_payment(&id, method, PaymentParams::default()),
    )
    .await;
    let paid = [&a, &b].iter().filter(|r| matches!(r, Ok(PaymentResult::Paid { .. }))).count();
    assert_eq!(paid, 1, "Exactly one payment should have succeeded");
    world.last_error = a.err().or(b.err());
}

#[when(expr = "the gateway confirms order {word}")]
async fn confirm_order(world: &mut RechargeWorld, alias: String) {
    callback(world, alias, API_SECRET.to_string()).await;
}

#[when(expr = "the gateway confirms order {word} with signature {string}")]
async fn confirm_order_with_signature(world: &mut RechargeWorld, alias: String, signature: String) {
    callback(world, alias, signature).await;
}

async fn callback(world: &mut RechargeWorld, alias: String, signature: String) {
    let id = world.order_id(&alias);
    let result = world.system().recharges.handle_callback(CallbackPayload::new(id, signature)).await;
    world.last_error = result.as_ref().err().cloned();
    world.last_callback = Some(result);
}

#[when(expr = "order {word} is moved to {word}")]
async fn move_order(world: &mut RechargeWorld, alias: String, status: String) {
    let id = world.order_id(&alias);
    let status = status.parse::<OrderStatusType>().expect("Unknown order status");
    let result = world.system().orders.transition(&id, status).await;
    world.last_error = result.err();
}

#[then(expr = "account {word} has a balance of {int}")]
async fn check_balance(world: &mut RechargeWorld, account: String, amount: i64) {
    let snapshot = world.system().accounts.check_balance(&account).await.expect("Error fetching balance");
    assert_eq!(snapshot.balance, Cents::from_major(amount), "Balance of {account} is incorrect");
}

#[then(expr = "order {word} is {word}")]
async fn check_order_status(world: &mut RechargeWorld, alias: String, status: String) {
    let id = world.order_id(&alias);
    let expected = status.parse::<OrderStatusType>().expect("Unknown order status");
    let snapshot = world.system().orders.check_order_status(&id).await.expect("Error fetching order");
    assert_eq!(snapshot.status, expected, "Order {alias} has the wrong status");
}

#[then(expr = "order {word} has an amount of {int}")]
async fn check_order_amount(world: &mut RechargeWorld, alias: String, amount: i64) {
    let id = world.order_id(&alias);
    let order = world.system().orders.fetch_order(&id).await.expect("Error fetching order");
    assert_eq!(order.amount, Cents::from_major(amount));
}

#[then("the payment succeeds")]
async fn payment_succeeds(world: &mut RechargeWorld) {
    let result = world.last_payment.as_ref().expect("No payment was made");
    assert!(matches!(result, Ok(PaymentResult::Paid { .. })), "Payment did not succeed: {result:?}");
}

#[then("the payment is declined")]
async fn payment_declined(world: &mut RechargeWorld) {
    let result = world.last_payment.as_ref().expect("No payment was made");
    assert!(matches!(result, Ok(PaymentResult::Declined { .. })), "Payment was not declined: {result:?}");
}

#[then(expr = "the payer is shown a QR code for {int}")]
async fn qr_code_shown(world: &mut RechargeWorld, amount: i64) {
    let result = world.last_payment.as_ref().expect("No payment was made");
    let Ok(PaymentResult::AwaitingConfirmation(descriptor)) = result else {
        panic!("Expected a QR code, got {result:?}");
    };
    assert_eq!(descriptor.amount, Cents::from_major(amount));
    assert!(descriptor.destination_url.contains(&format!("order_id={}", descriptor.order_id)));
    assert!(descriptor.encoded_image.starts_with("data:image/svg+xml;base64,"));
}

#[then("the callback recharges the order")]
async fn callback_recharges(world: &mut RechargeWorld) {
    let result = world.last_callback.as_ref().expect("No callback was received");
    assert!(matches!(result, Ok(CallbackResult::Recharged { .. })), "Callback did not recharge: {result:?}");
}

#[then("the callback reports the order as already recharged")]
async fn callback_already_recharged(world: &mut RechargeWorld) {
    let result = world.last_callback.as_ref().expect("No callback was received");
    assert!(matches!(result, Ok(CallbackResult::AlreadyRecharged(_))), "Unexpected callback result: {result:?}");
}

#[then(expr = "the request fails with {word}")]
async fn request_fails_with(world: &mut RechargeWorld, kind: String) {
    let err = world.last_error.as_ref().expect("The last request did not fail");
    let actual = match err {
        PaymentGatewayError::InvalidAccount(_) => "InvalidAccount",
        PaymentGatewayError::InvalidAmount(_) => "InvalidAmount",
        PaymentGatewayError::OrderNotFound(_) => "OrderNotFound",
        PaymentGatewayError::UnsupportedMethod(_) => "UnsupportedMethod",
        PaymentGatewayError::InsufficientBalance { .. } => "InsufficientBalance",
        PaymentGatewayError::InvalidSignature(_) => "InvalidSignature",
        PaymentGatewayError::GatewayUnavailable(_) => "GatewayUnavailable",
        PaymentGatewayError::NotImplemented(_) => "NotImplemented",
        PaymentGatewayError::IllegalTransition(_) => "IllegalTransition",
        PaymentGatewayError::OrderNotPayable { .. } => "OrderNotPayable",
        PaymentGatewayError::DescriptorError(_) => "DescriptorError",
        PaymentGatewayError::DatabaseError(_) => "DatabaseError",
    };
    assert_eq!(actual, kind, "Unexpected error: {err}");
}
