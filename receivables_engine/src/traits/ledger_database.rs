use log::*;
use rcv_common::Money;
use thiserror::Error;

use crate::{
    allocation::OverpaymentPolicy,
    db_types::NewPayment,
    traits::data_objects::{CreditApplication, PaymentAllocation, PaymentReversal},
};

/// This trait defines the mutating half of a receivables ledger backend.
///
/// Every method runs as a single atomic unit of work that is scoped to one client:
/// * The client's ledger is locked before anything is read, so that concurrent mutations for the same client are
///   serialized.
/// * Either all the writes of the unit of work are committed, or none of them are.
///
/// Backends must never apply a payment to an order belonging to a different client, and must never let an order's
/// `paid` amount drop below zero or rise above its total.
#[allow(async_fn_in_trait)]
pub trait LedgerDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Records a new payment and distributes it across the client's open orders, oldest first.
    ///
    /// In a single atomic transaction,
    /// * the client's ledger is locked. If the client does not exist, `ClientNotFound` is returned.
    /// * the client's open orders are read in FIFO order (order date, then id).
    /// * the payment row is inserted, with one allocation row per order it touches.
    /// * each touched order's `paid` amount and status are updated.
    ///
    /// Any amount left over after every open order is settled is handled according to `policy`.
    async fn register_payment(
        &self,
        payment: NewPayment,
        policy: OverpaymentPolicy,
    ) -> Result<PaymentAllocation, LedgerError>;

    /// Deletes a payment and reverses every allocation it created.
    ///
    /// In a single atomic transaction,
    /// * the payment's client ledger is locked. If the payment does not exist, `PaymentNotFound` is returned.
    /// * every order the payment was allocated to has its `paid` amount reduced by the allocated amount, and its
    ///   status re-derived.
    /// * the allocation rows, and then the payment row, are deleted.
    async fn delete_payment(&self, payment_id: i64) -> Result<PaymentReversal, LedgerError>;

    /// Applies any unapplied credit the client holds to their open orders. Credit from the oldest payment is used
    /// first, and orders are paid in FIFO order.
    async fn apply_client_credit(&self, client_id: i64) -> Result<CreditApplication, LedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Broad classification of ledger errors. Transports map these onto their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    ConsistencyViolation,
    ConcurrencyConflict,
    Persistence,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Amounts must be positive and no larger than $10000000000000.00, but {0} was given.")]
    InvalidAmount(Money),
    #[error("The payment of {amount} exceeds the {outstanding} outstanding on the client's open orders.")]
    Overpayment { amount: Money, outstanding: Money },
    #[error("Order #{order_id} cannot be voided because {paid} has already been paid against it.")]
    OrderNotVoidable { order_id: i64, paid: Money },
    #[error("Client #{0} does not exist.")]
    ClientNotFound(i64),
    #[error("Payment #{0} does not exist.")]
    PaymentNotFound(i64),
    #[error("Order #{0} does not exist.")]
    OrderNotFound(i64),
    #[error("Payment method #{0} does not exist.")]
    PaymentMethodNotFound(i64),
    #[error("Ledger consistency violation. {0}")]
    ConsistencyViolation(String),
    #[error("The ledger was modified concurrently. {0}")]
    ConcurrencyConflict(String),
    #[error("Database error. {0}")]
    PersistenceError(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount(_) | Self::Overpayment { .. } | Self::OrderNotVoidable { .. } => {
                ErrorKind::Validation
            },
            Self::ClientNotFound(_) |
            Self::PaymentNotFound(_) |
            Self::OrderNotFound(_) |
            Self::PaymentMethodNotFound(_) => ErrorKind::NotFound,
            Self::ConsistencyViolation(_) => ErrorKind::ConsistencyViolation,
            Self::ConcurrencyConflict(_) => ErrorKind::ConcurrencyConflict,
            Self::PersistenceError(_) => ErrorKind::Persistence,
        }
    }

    /// Only conflicts are worth retrying. Retrying anything else produces the same result.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

// SQLite primary result codes (the low byte of the extended code).
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;
const SQLITE_CONSTRAINT_CHECK: i32 = 275;

fn sqlite_code(code: Option<&str>) -> Option<i32> {
    code.and_then(|c| c.parse::<i32>().ok())
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        let code = match &e {
            sqlx::Error::Database(db_err) => sqlite_code(db_err.code().as_deref()),
            _ => None,
        };
        match code {
            Some(c) if matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED) => {
                debug!("🗃️ Lock contention on the ledger: {e}");
                Self::ConcurrencyConflict(e.to_string())
            },
            Some(SQLITE_CONSTRAINT_CHECK) => {
                error!("🗃️ A ledger CHECK constraint rejected a write: {e}");
                Self::ConsistencyViolation(e.to_string())
            },
            _ => Self::PersistenceError(e.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for LedgerError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::PersistenceError(format!("Migration failed. {e}"))
    }
}
