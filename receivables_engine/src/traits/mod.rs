//! # Ledger backends
//!
//! This module provides the interfaces that define the contracts of the receivables ledger *backends*.
//!
//! ## Traits
//! * [`LedgerDatabase`] defines the mutating operations: registering and deleting payments, and applying held credit.
//!   Each of these is an atomic unit of work that locks the affected client's ledger.
//! * [`ReceivablesManagement`] provides read-only queries for orders, payments, allocations and report data.
//! * [`ClientRegistry`] and [`OrderManagement`] are the narrow slices of the Clients, Payment Methods and Orders
//!   subsystems that the ledger depends on.
mod client_registry;
mod data_objects;
mod ledger_database;
mod receivables_management;

pub use client_registry::{ClientRegistry, OrderManagement};
pub use data_objects::{
    ClientLedger,
    CreditApplication,
    PaymentAllocation,
    PaymentHistoryEntry,
    PaymentReversal,
    ReceivableOrder,
};
pub use ledger_database::{ErrorKind, LedgerDatabase, LedgerError};
pub use receivables_management::ReceivablesManagement;
