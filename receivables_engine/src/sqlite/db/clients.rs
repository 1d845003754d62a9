use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Client, NewClient},
    traits::LedgerError,
};

/// Takes the write lock for a client's ledger by bumping its `ledger_version`.
///
/// This must be the first statement of every mutating transaction. SQLite has a single writer, so the write lock is
/// acquired here before any rows are read, and no transaction ever has to upgrade a read lock. Returns
/// `ClientNotFound` if no such client exists.
pub async fn lock_ledger(client_id: i64, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    let result = sqlx::query("UPDATE clients SET ledger_version = ledger_version + 1 WHERE id = $1")
        .bind(client_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(LedgerError::ClientNotFound(client_id));
    }
    trace!("🗃️ Ledger for client #{client_id} is locked");
    Ok(())
}

pub async fn insert_client(client: NewClient, conn: &mut SqliteConnection) -> Result<Client, LedgerError> {
    let client: Client = sqlx::query_as("INSERT INTO clients (name) VALUES ($1) RETURNING *")
        .bind(client.name)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Client #{} ({}) created", client.id, client.name);
    Ok(client)
}

pub async fn fetch_client(client_id: i64, conn: &mut SqliteConnection) -> Result<Option<Client>, sqlx::Error> {
    let client = sqlx::query_as("SELECT * FROM clients WHERE id = $1").bind(client_id).fetch_optional(conn).await?;
    Ok(client)
}

/// Locks the ledger of the client that made the given payment. This is the single-statement equivalent of looking up
/// the payment's client and calling [`lock_ledger`], so it too can be the first statement of a transaction.
/// Returns `PaymentNotFound` if the payment does not exist.
pub async fn lock_ledger_for_payment(payment_id: i64, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    let result = sqlx::query(
        "UPDATE clients SET ledger_version = ledger_version + 1 WHERE id = (SELECT client_id FROM payments WHERE id = \
         $1)",
    )
    .bind(payment_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(LedgerError::PaymentNotFound(payment_id));
    }
    trace!("🗃️ Ledger for the client of payment #{payment_id} is locked");
    Ok(())
}

/// Locks the ledger of the client that owns the given order. Returns `OrderNotFound` if the order does not exist.
pub async fn lock_ledger_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
    let result = sqlx::query(
        "UPDATE clients SET ledger_version = ledger_version + 1 WHERE id = (SELECT client_id FROM orders WHERE id = $1)",
    )
    .bind(order_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(LedgerError::OrderNotFound(order_id));
    }
    trace!("🗃️ Ledger for the client of order #{order_id} is locked");
    Ok(())
}
