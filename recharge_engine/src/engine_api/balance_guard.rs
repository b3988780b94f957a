use std::fmt::Debug;

use log::*;
use rpg_common::Cents;

use crate::{
    db_types::{Account, AccountId},
    traits::{LedgerStore, PaymentGatewayError},
};

/// The only component that changes account balances.
///
/// Debits and credits are single atomic updates in the ledger. A debit re-reads the balance under the account's lock,
/// so two concurrent debits can never both spend the same funds, and balances never go negative.
pub struct BalanceGuard<B> {
    db: B,
}

impl<B> Debug for BalanceGuard<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BalanceGuard")
    }
}

impl<B: Clone> Clone for BalanceGuard<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone() }
    }
}

impl<B> BalanceGuard<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> BalanceGuard<B>
where B: LedgerStore
{
    /// Checks that `account` holds at least `amount`, without reserving anything.
    ///
    /// This is advisory. The authoritative check happens inside [`Self::debit`].
    pub async fn verify_funds(&self, account: &AccountId, amount: Cents) -> Result<Account, PaymentGatewayError> {
        check_amount(amount)?;
        let acc = self.db.fetch_account(account).await?;
        if acc.balance < amount {
            debug!("💳️ Account {account} holds {}, which does not cover {amount}", acc.balance);
            return Err(insufficient(account, amount, acc.balance));
        }
        Ok(acc)
    }

    /// Removes `amount` from the account's balance, or fails with `InsufficientBalance` and leaves it untouched.
    pub async fn debit(&self, account: &AccountId, amount: Cents) -> Result<Account, PaymentGatewayError> {
        check_amount(amount)?;
        let (acc, _) = self
            .db
            .update_account(account, |acc| {
                let balance = acc.balance;
                acc.balance = balance
                    .checked_sub(amount)
                    .filter(|b| !b.is_negative())
                    .ok_or_else(|| insufficient(account, amount, balance))?;
                Ok(())
            })
            .await?;
        info!("💳️ Debited {amount} from {account}. Balance is now {}", acc.balance);
        Ok(acc)
    }

    /// Adds `amount` to the account's balance, creating the account if necessary.
    pub async fn credit(&self, account: &AccountId, amount: Cents) -> Result<Account, PaymentGatewayError> {
        check_amount(amount)?;
        let (acc, _) = self
            .db
            .update_account(account, |acc| {
                acc.balance = acc.balance.checked_add(amount).ok_or_else(|| {
                    PaymentGatewayError::InvalidAmount(format!("Crediting {amount} to {account} would overflow"))
                })?;
                Ok(())
            })
            .await?;
        info!("💳️ Credited {amount} to {account}. Balance is now {}", acc.balance);
        Ok(acc)
    }

    pub async fn balance(&self, account: &AccountId) -> Result<Cents, PaymentGatewayError> {
        Ok(self.db.fetch_account(account).await?.balance)
    }
}

fn check_amount(amount: Cents) -> Result<(), PaymentGatewayError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(PaymentGatewayError::InvalidAmount(format!("Balance adjustments must be positive, not {amount}")))
    }
}

fn insufficient(account: &AccountId, required: Cents, available: Cents) -> PaymentGatewayError {
    PaymentGatewayError::InsufficientBalance { account: account.clone(), required, available }
}
