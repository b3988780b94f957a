//! Unifies API for accessing accounts.

use std::fmt::Debug;

use log::*;
use rpg_common::Cents;

use crate::{
    db_types::{Account, AccountId},
    engine_api::account_objects::{AccountHistory, BalanceSnapshot},
    traits::{LedgerStore, PaymentGatewayError},
};

/// The `AccountApi` provides read access to accounts, plus registration and initial funding.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B: Clone> Clone for AccountApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> AccountApi<B>
where B: LedgerStore
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Makes sure the account exists, and returns it. Registering an existing account is a no-op.
    pub async fn register_account(&self, account: &str) -> Result<Account, PaymentGatewayError> {
        let account_id = account.parse::<AccountId>()?;
        let account = self.db.fetch_account(&account_id).await?;
        trace!("💻️ Account {account_id} is registered with balance {}", account.balance);
        Ok(account)
    }

    /// The current balance of the account. Unknown accounts have a zero balance.
    pub async fn check_balance(&self, account: &str) -> Result<BalanceSnapshot, PaymentGatewayError> {
        let account_id = account.parse::<AccountId>()?;
        let account = self.db.fetch_account(&account_id).await?;
        Ok(account.into())
    }

    /// The account, together with every order it has placed, oldest first.
    pub async fn history(&self, account: &str) -> Result<AccountHistory, PaymentGatewayError> {
        let account_id = account.parse::<AccountId>()?;
        let account = self.db.fetch_account(&account_id).await?;
        let orders = self.db.fetch_orders_for_account(&account_id).await?;
        Ok(AccountHistory { account, orders })
    }

    /// Gives a fresh account its opening balance.
    ///
    /// The balance is only set if the account holds nothing and has never placed an order, so seeding the same
    /// accounts again on every start-up does not mint money.
    pub async fn seed_account(&self, account: &str, amount: Cents) -> Result<Account, PaymentGatewayError> {
        let account_id = account.parse::<AccountId>()?;
        if amount.is_negative() {
            return Err(PaymentGatewayError::InvalidAmount(format!("Opening balances cannot be negative: {amount}")));
        }
        let has_orders = !self.db.fetch_orders_for_account(&account_id).await?.is_empty();
        let (account, seeded) = self
            .db
            .update_account(&account_id, |acc| {
                if has_orders || acc.balance != Cents::default() {
                    return Ok(false);
                }
                acc.balance = amount;
                Ok(true)
            })
            .await?;
        if seeded {
            info!("💻️ Account {account_id} has been seeded with {amount}");
        } else {
            debug!("💻️ Account {account_id} is already in use. Leaving its balance of {} alone", account.balance);
        }
        Ok(account)
    }
}
