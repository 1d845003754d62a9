//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or create an atomic transaction as
//! the need arises and call through to the functions without any other changes.
//!
//! None of the functions here lock anything by themselves. Mutating callers must call [`clients::lock_ledger`] as the
//! first statement of their transaction.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Error as SqlxError,
    SqlitePool,
};

pub mod allocations;
pub mod clients;
pub mod orders;
pub mod payment_methods;
pub mod payments;
pub mod receivables;

const SQLITE_DB_URL: &str = "sqlite://data/receivables.db";
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

pub fn db_url() -> String {
    let result = env::var("RCV_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ RCV_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool with WAL journaling and foreign keys enabled. Writers that find the database locked wait
/// up to `busy_timeout` before failing with `SQLITE_BUSY`.
pub async fn new_pool(url: &str, max_connections: u32, busy_timeout: Duration) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(busy_timeout);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
