use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{AccountId, NewOrder, Order, OrderId},
    traits::PaymentGatewayError,
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
///
/// New orders are always `pending`.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                id,
                account,
                recipient,
                amount,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, 'pending', $5, $5)
            RETURNING *;
        "#,
    )
    .bind(order.id)
    .bind(order.account)
    .bind(order.recipient)
    .bind(order.amount)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order [{}] inserted for {}", order.id, order.account);
    Ok(order)
}

pub async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_orders_for_account(
    account_id: &AccountId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE account = $1 ORDER BY created_at ASC")
        .bind(account_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Writes back the mutable fields of an order. The id, parties, amount and creation time are never updated.
pub async fn update_order(order: &Order, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                status = $1,
                transaction_id = $2,
                updated_at = $3,
                paid_at = $4,
                recharged_at = $5
            WHERE id = $6
            RETURNING *;
        "#,
    )
    .bind(order.status)
    .bind(order.transaction_id.as_deref())
    .bind(order.updated_at)
    .bind(order.paid_at)
    .bind(order.recharged_at)
    .bind(order.id.as_str())
    .fetch_one(conn)
    .await?;
    Ok(order)
}
