use crate::{
    db_types::{Allocation, Order, Payment},
    traits::{
        data_objects::{ClientLedger, PaymentHistoryEntry, ReceivableOrder},
        LedgerError,
    },
};

/// Read-only queries over the receivables ledger.
///
/// None of these methods modify state. Each returns data from a single consistent snapshot, so that callers never
/// observe a payment without its allocations, or an allocation without the matching change to its order.
#[allow(async_fn_in_trait)]
pub trait ReceivablesManagement {
    /// Fetches the payment with the given id, if it exists.
    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, LedgerError>;

    /// Fetches a payment together with the allocations it created, in the order they were created. Both are read from
    /// the same snapshot. Returns `None` if the payment does not exist.
    async fn fetch_payment_detail(&self, payment_id: i64) -> Result<Option<(Payment, Vec<Allocation>)>, LedgerError>;

    /// Fetches every allocation that has been applied to the given order.
    async fn fetch_allocations_for_order(&self, order_id: i64) -> Result<Vec<Allocation>, LedgerError>;

    /// Fetches the client's open (`Pending` or `Partial`) orders in FIFO order.
    ///
    /// Returns `ClientNotFound` if the client does not exist.
    async fn fetch_open_orders_for_client(&self, client_id: i64) -> Result<Vec<Order>, LedgerError>;

    /// Fetches every open order across all clients that still has a positive balance, together with the client's
    /// name. Orders are returned grouped by client, and in FIFO order within each client.
    async fn fetch_receivable_orders(&self) -> Result<Vec<ReceivableOrder>, LedgerError>;

    /// Fetches the `limit` most recent payments, newest first.
    async fn fetch_payment_history(&self, limit: i64) -> Result<Vec<PaymentHistoryEntry>, LedgerError>;

    /// Fetches every order, payment and allocation belonging to the client. Returns `None` if the client does not
    /// exist.
    async fn fetch_client_ledger(&self, client_id: i64) -> Result<Option<ClientLedger>, LedgerError>;
}
