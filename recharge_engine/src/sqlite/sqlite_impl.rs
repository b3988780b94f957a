//! `SqliteLedger` is the durable implementation of [`LedgerStore`].
//!
//! Every update runs inside an sqlx [`Transaction`], whose first statement takes SQLite's write lock before the record
//! is read. Two writers therefore never read the same snapshot, and the busy timeout queues them instead of failing.
//! A transaction that is dropped before it finishes, e.g. because the caller timed out, is rolled back by sqlx.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::{migrate, Sqlite, SqlitePool, Transaction};

use super::db::{accounts, db_url, new_pool, orders, take_write_lock};
use crate::{
    db_types::{Account, AccountId, NewOrder, Order, OrderId},
    traits::{LedgerStore, PaymentGatewayError},
};

#[derive(Clone)]
pub struct SqliteLedger {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteLedger ({:?})", self.pool)
    }
}

impl LedgerStore for SqliteLedger {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_account(&self, account_id: &AccountId) -> Result<Account, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let account = accounts::fetch_or_create_account(account_id, &mut conn).await?;
        Ok(account)
    }

    async fn update_order<F, T>(&self, order_id: &OrderId, mutator: F) -> Result<(Order, T), PaymentGatewayError>
    where
        F: FnOnce(&mut Order) -> Result<T, PaymentGatewayError> + Send,
        T: Send,
    {
        let mut tx = self.begin_write().await?;
        let result = async {
            let mut order = orders::fetch_order(order_id, &mut tx)
                .await?
                .ok_or_else(|| PaymentGatewayError::OrderNotFound(order_id.clone()))?;
            let value = mutator(&mut order)?;
            let order = orders::update_order(&order, &mut tx).await?;
            trace!("🗃️ Order [{order_id}] updated. Status is {}", order.status);
            Ok::<_, PaymentGatewayError>((order, value))
        }
        .await;
        finish(tx, result).await
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
        let mut tx = self.begin_write().await?;
        let result = async {
            let mut account = accounts::fetch_or_create_account(account_id, &mut tx).await?;
            let value = mutator(&mut account)?;
            account.updated_at = Utc::now();
            let account = accounts::update_balance(&account, &mut tx).await?;
            trace!("🗃️ Account {account_id} updated. Balance is {}", account.balance);
            Ok::<_, PaymentGatewayError>((account, value))
        }
        .await;
        finish(tx, result).await
    }

    async fn fetch_orders_for_account(&self, account_id: &AccountId) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_account(account_id, &mut conn).await?;
        Ok(orders)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Commits the transaction if `result` is `Ok`, and rolls it back otherwise.
async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    result: Result<T, PaymentGatewayError>,
) -> Result<T, PaymentGatewayError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        },
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!("🗃️ Could not roll back transaction after '{e}': {rollback_err}");
            }
            Err(e)
        },
    }
}

impl SqliteLedger {
    /// Creates a new ledger using the URL in `RPG_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteLedger::new_with_url(url.as_str(), max_connections).await
    }

    /// Connects to the database at `url`, creating it if necessary, and brings the schema up to date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        migrate!("./src/sqlite/migrations").run(&pool).await?;
        debug!("🗃️ Ledger migrations are up to date");
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        take_write_lock(&mut tx).await?;
        Ok(tx)
    }
}
