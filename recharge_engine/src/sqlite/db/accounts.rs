use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{Account, AccountId};

/// Fetches the account, creating it with a zero balance if it does not exist yet.
pub async fn fetch_or_create_account(
    account_id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<Account, sqlx::Error> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO accounts (id, balance, created_at, updated_at) VALUES ($1, 0, $2, $2) ON CONFLICT(id) DO NOTHING",
    )
    .bind(account_id.as_str())
    .bind(now)
    .execute(&mut *conn)
    .await?;
    let account = sqlx::query_as("SELECT * FROM accounts WHERE id = $1").bind(account_id.as_str()).fetch_one(conn).await?;
    Ok(account)
}

/// Writes back the balance of an account. The `CHECK (balance >= 0)` constraint rejects overdrafts.
pub async fn update_balance(account: &Account, conn: &mut SqliteConnection) -> Result<Account, sqlx::Error> {
    let account = sqlx::query_as("UPDATE accounts SET balance = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(account.balance)
        .bind(account.updated_at)
        .bind(account.id.as_str())
        .fetch_one(conn)
        .await?;
    Ok(account)
}
