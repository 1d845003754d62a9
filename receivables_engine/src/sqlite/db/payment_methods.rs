use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPaymentMethod, PaymentMethod},
    traits::LedgerError,
};

pub async fn insert_payment_method(
    method: NewPaymentMethod,
    conn: &mut SqliteConnection,
) -> Result<PaymentMethod, LedgerError> {
    let method: PaymentMethod = sqlx::query_as("INSERT INTO payment_methods (name, kind) VALUES ($1, $2) RETURNING *")
        .bind(method.name)
        .bind(method.kind)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Payment method #{} ({}) created", method.id, method.name);
    Ok(method)
}

pub async fn fetch_payment_method(
    method_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentMethod>, sqlx::Error> {
    let method =
        sqlx::query_as("SELECT * FROM payment_methods WHERE id = $1").bind(method_id).fetch_optional(conn).await?;
    Ok(method)
}
