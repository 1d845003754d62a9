use log::*;
use rcv_common::Money;
use sqlx::SqliteConnection;

use crate::{db_types::Allocation, traits::LedgerError};

pub async fn insert_allocation(
    payment_id: i64,
    order_id: i64,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Allocation, LedgerError> {
    let allocation: Allocation =
        sqlx::query_as("INSERT INTO allocations (payment_id, order_id, amount) VALUES ($1, $2, $3) RETURNING *")
            .bind(payment_id)
            .bind(order_id)
            .bind(amount)
            .fetch_one(conn)
            .await?;
    trace!("🗃️ Allocation #{}: {amount} from payment #{payment_id} to order #{order_id}", allocation.id);
    Ok(allocation)
}

pub async fn fetch_allocations_for_payment(
    payment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Allocation>, sqlx::Error> {
    let allocations = sqlx::query_as("SELECT * FROM allocations WHERE payment_id = $1 ORDER BY id ASC")
        .bind(payment_id)
        .fetch_all(conn)
        .await?;
    Ok(allocations)
}

pub async fn fetch_allocations_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Allocation>, sqlx::Error> {
    let allocations = sqlx::query_as("SELECT * FROM allocations WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(allocations)
}

/// Every allocation that touches the client, either through one of their payments or one of their orders.
pub async fn fetch_allocations_for_client(
    client_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Allocation>, sqlx::Error> {
    let allocations = sqlx::query_as(
        r#"
            SELECT * FROM allocations
            WHERE payment_id IN (SELECT id FROM payments WHERE client_id = $1)
               OR order_id IN (SELECT id FROM orders WHERE client_id = $1)
            ORDER BY id ASC
        "#,
    )
    .bind(client_id)
    .fetch_all(conn)
    .await?;
    Ok(allocations)
}

/// Deletes every allocation made by the payment and returns how many there were.
pub async fn delete_allocations_for_payment(payment_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM allocations WHERE payment_id = $1").bind(payment_id).execute(conn).await?;
    Ok(result.rows_affected())
}
