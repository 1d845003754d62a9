use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment},
    traits::LedgerError,
};

pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, LedgerError> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (client_id, amount, payment_date, method_id, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(payment.client_id)
    .bind(payment.amount)
    .bind(payment.payment_date)
    .bind(payment.method_id)
    .bind(payment.description)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Payment #{} of {} recorded for client #{}", payment.id, payment.amount, payment.client_id);
    Ok(payment)
}

pub async fn fetch_payment(payment_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(payment_id).fetch_optional(conn).await?;
    Ok(payment)
}

/// All of the client's payments, oldest first.
pub async fn fetch_payments_for_client(
    client_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE client_id = $1 ORDER BY payment_date ASC, id ASC")
        .bind(client_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

/// Deletes the payment row. Its allocations must already have been removed.
pub async fn delete_payment(payment_id: i64, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    let result = sqlx::query("DELETE FROM payments WHERE id = $1").bind(payment_id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(LedgerError::PaymentNotFound(payment_id));
    }
    trace!("🗃️ Payment #{payment_id} deleted");
    Ok(())
}
