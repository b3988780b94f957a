use chrono::{DateTime, Utc};
use rpg_common::Cents;
use serde::{Deserialize, Serialize};

use crate::db_types::{Account, AccountId, Order};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub account: AccountId,
    pub balance: Cents,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for BalanceSnapshot {
    fn from(account: Account) -> Self {
        Self { account: account.id, balance: account.balance, updated_at: account.updated_at }
    }
}

/// An account along with the orders it has placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountHistory {
    pub account: Account,
    pub orders: Vec<Order>,
}
