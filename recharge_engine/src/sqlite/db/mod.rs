//! # SQLite ledger queries
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers obtain a connection from the pool, open a transaction if they need one, and call through to
//! these functions unchanged.
use std::env;

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqliteConnection,
    SqlitePool,
};

pub mod accounts;
pub mod orders;

const SQLITE_DB_URL: &str = "sqlite://data/recharge_ledger.db";

/// The ledger database URL from `RPG_DATABASE_URL`, falling back to a file in `./data`.
pub fn db_url() -> String {
    let result = env::var("RPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ RPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = url.parse::<SqliteConnectOptions>()?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Takes SQLite's write lock for the current transaction without changing any rows.
///
/// Run this first in any read-modify-write transaction. A deferred transaction that reads before it writes can find
/// its snapshot stale when it later tries to write, and fails with `SQLITE_BUSY` instead of waiting.
pub async fn take_write_lock(conn: &mut SqliteConnection) -> Result<(), SqlxError> {
    sqlx::query("UPDATE accounts SET balance = balance WHERE 0").execute(conn).await?;
    Ok(())
}
