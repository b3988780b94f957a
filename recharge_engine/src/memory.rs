//! `InMemoryLedger` keeps orders and accounts in process memory.
//!
//! Each record sits behind its own `tokio::sync::Mutex`, and the tables are shared indexes behind a `RwLock`. The
//! index lock is only held long enough to find (or create) a record's mutex, so updates to different records never
//! wait on each other.
//!
//! Clones share the same tables.
use std::{collections::HashMap, fmt::Debug, hash::Hash, sync::Arc};

use chrono::Utc;
use log::*;
use tokio::sync::{Mutex, RwLock};

use crate::{
    db_types::{Account, AccountId, NewOrder, Order, OrderId},
    traits::{LedgerStore, PaymentGatewayError},
};

type Table<K, V> = Arc<RwLock<HashMap<K, Arc<Mutex<V>>>>>;

#[derive(Clone, Default)]
pub struct InMemoryLedger {
    orders: Table<OrderId, Order>,
    accounts: Table<AccountId, Account>,
}

impl Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InMemoryLedger")
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    async fn order_entry(&self, order_id: &OrderId) -> Option<Arc<Mutex<Order>>> {
        self.orders.read().await.get(order_id).cloned()
    }

    async fn account_entry(&self, account_id: &AccountId) -> Arc<Mutex<Account>> {
        if let Some(entry) = self.accounts.read().await.get(account_id) {
            return Arc::clone(entry);
        }
        let mut accounts = self.accounts.write().await;
        let entry = accounts.entry(account_id.clone()).or_insert_with(|| {
            debug!("🗃️ Creating account {account_id}");
            Arc::new(Mutex::new(Account::new(account_id.clone())))
        });
        Arc::clone(entry)
    }
}

/// Runs the mutator against a copy of the record and only writes the copy back if the mutator succeeds.
fn apply<V, F, T>(record: &mut V, mutator: F) -> Result<T, PaymentGatewayError>
where
    V: Clone,
    F: FnOnce(&mut V) -> Result<T, PaymentGatewayError>,
{
    let mut draft = record.clone();
    let result = mutator(&mut draft)?;
    *record = draft;
    Ok(result)
}

async fn snapshot<K: Eq + Hash, V: Clone>(table: &Table<K, V>) -> Vec<V> {
    let entries = table.read().await.values().cloned().collect::<Vec<_>>();
    let mut result = Vec::with_capacity(entries.len());
    for entry in entries {
        result.push(entry.lock().await.clone());
    }
    result
}

impl LedgerStore for InMemoryLedger {
    fn url(&self) -> &str {
        "memory://"
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let order = order.into_order();
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(PaymentGatewayError::DatabaseError(format!("Order {} already exists", order.id)));
        }
        orders.insert(order.id.clone(), Arc::new(Mutex::new(order.clone())));
        debug!("🗃️ Order [{}] has been saved with status {}", order.id, order.status);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        match self.order_entry(order_id).await {
            Some(entry) => Ok(Some(entry.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn fetch_account(&self, account_id: &AccountId) -> Result<Account, PaymentGatewayError> {
        let entry = self.account_entry(account_id).await;
        let account = entry.lock().await.clone();
        Ok(account)
    }

    async fn update_order<F, T>(&self, order_id: &OrderId, mutator: F) -> Result<(Order, T), PaymentGatewayError>
    where
        F: FnOnce(&mut Order) -> Result<T, PaymentGatewayError> + Send,
        T: Send,
    {
        let entry = self.order_entry(order_id).await.ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))?;
        let mut order = entry.lock().await;
        let result = apply(&mut *order, mutator)?;
        trace!("🗃️ Order [{order_id}] updated. Status is {}", order.status);
        Ok((order.clone(), result))
    }

    async fn update_account<F, T>(
        &self,
        account_id: &AccountId,
        mutator: F,
    ) -> Result<(Account, T), PaymentGatewayError>
    where
        F: FnOnce(&mut Account) -> Result<T, PaymentGatewayError> + Send,
        T: Send,
    {
        let entry = self.account_entry(account_id).await;
        let mut account = entry.lock().await;
        let result = apply(&mut *account, |draft: &mut Account| {
            let result = mutator(draft)?;
            if draft.balance.is_negative() {
                return Err(PaymentGatewayError::DatabaseError(format!(
                    "Refusing to commit a negative balance for account {account_id}"
                )));
            }
            draft.updated_at = Utc::now();
            Ok(result)
        })?;
        trace!("🗃️ Account {account_id} updated. Balance is {}", account.balance);
        Ok((account.clone(), result))
    }

    async fn fetch_orders_for_account(&self, account_id: &AccountId) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut orders =
            snapshot(&self.orders).await.into_iter().filter(|o| &o.account == account_id).collect::<Vec<_>>();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }
}
