pub mod recharge_world;
pub mod setups;
pub mod steps;

pub use recharge_world::RechargeWorld;
