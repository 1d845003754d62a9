//! Report queries that span clients.
use sqlx::SqliteConnection;

use crate::traits::{PaymentHistoryEntry, ReceivableOrder};

/// Name reported for records whose client row cannot be found.
pub const UNKNOWN_CLIENT: &str = "Unknown";

/// Open orders with a positive balance across all clients, grouped by client and in FIFO order within each client.
pub async fn fetch_receivable_orders(conn: &mut SqliteConnection) -> Result<Vec<ReceivableOrder>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT o.*, COALESCE(c.name, $1) AS client_name
            FROM orders o LEFT JOIN clients c ON c.id = o.client_id
            WHERE o.status IN ('Pending', 'Partial') AND o.total > o.paid
            ORDER BY o.client_id ASC, o.order_date ASC, o.id ASC
        "#,
    )
    .bind(UNKNOWN_CLIENT)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// The most recent `limit` payments, newest first, with the client and payment method names resolved.
pub async fn fetch_payment_history(
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentHistoryEntry>, sqlx::Error> {
    let payments = sqlx::query_as(
        r#"
            SELECT
                p.id,
                p.client_id,
                COALESCE(c.name, $1) AS client_name,
                p.amount,
                COALESCE((SELECT SUM(a.amount) FROM allocations a WHERE a.payment_id = p.id), 0) AS applied,
                p.payment_date,
                p.method_id,
                m.name AS method_name,
                p.description
            FROM payments p
                LEFT JOIN clients c ON c.id = p.client_id
                LEFT JOIN payment_methods m ON m.id = p.method_id
            ORDER BY p.payment_date DESC, p.id DESC
            LIMIT $2
        "#,
    )
    .bind(UNKNOWN_CLIENT)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(payments)
}
