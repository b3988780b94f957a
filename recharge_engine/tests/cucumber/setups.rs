use cucumber::given;
use recharge_engine::payment::{FailedPaymentPolicy, PaymentConfig};
use rpg_common::Cents;

use crate::cucumber::{recharge_world::RechargeSystem, RechargeWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut RechargeWorld) {
    let system = RechargeSystem::new(PaymentConfig::default()).await;
    world.system = Some(system);
}

#[given("a fresh install that fails declined orders")]
async fn fresh_database_mark_failed(world: &mut RechargeWorld) {
    let config = PaymentConfig::default().with_failed_payment_policy(FailedPaymentPolicy::MarkFailed);
    world.system = Some(RechargeSystem::new(config).await);
}

#[given(expr = "account {word} has a balance of {int}")]
async fn seed_balance(world: &mut RechargeWorld, account: String, amount: i64) {
    let amount = Cents::from_major(amount);
    world.system().accounts.seed_account(&account, amount).await.expect("Error seeding account");
}

#[given("the payment gateway declines payments")]
async fn gateway_declines(world: &mut RechargeWorld) {
    world.system().switch.set_declining(true);
}

#[given("the payment gateway approves payments")]
async fn gateway_approves(world: &mut RechargeWorld) {
    world.system().switch.set_declining(false);
}
