//! Receivables Engine
//!
//! The receivables engine is the accounts-receivable core of a small-business order system. It records the payments
//! clients make, distributes each payment across the client's open orders (oldest first), reverses that distribution
//! when a payment is deleted, and reports what every client still owes.
//!
//! The library is divided into these main sections:
//! 1. Pure ledger logic: [`allocation`] plans how a payment is spread across orders, [`reversal`] plans how that is
//!    undone, and [`balance`] projects debts and audits a client's ledger. None of these touch storage.
//! 2. Storage backends ([`traits`]). A backend must implement the traits in this module to host the ledger. SQLite is
//!    the supported backend. You should never need to access the database directly; use the public API instead. The
//!    exception is the data types stored in the database, which are defined in [`db_types`] and are public.
//! 3. The public API ([`PaymentFlowApi`] and [`ReceivablesApi`]). These validate input, retry units of work that lost
//!    a race for a client's ledger, and publish events.
//!
//! The engine also provides a set of [`events`] that can be subscribed to, for example when an order is settled.
pub mod allocation;
pub mod balance;
pub mod db_types;
pub mod events;
mod ledger_api;
pub mod reversal;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use allocation::OverpaymentPolicy;
pub use ledger_api::{
    payment_flow_api::PaymentFlowApi,
    receivables_api::{PaymentDetail, ReceivablesApi, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT},
    retry::RetryPolicy,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db::db_url, SqliteDatabase};
pub use traits::{ClientRegistry, LedgerDatabase, LedgerError, OrderManagement, ReceivablesManagement};
