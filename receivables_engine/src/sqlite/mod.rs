//! SQLite backend for the receivables ledger.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
