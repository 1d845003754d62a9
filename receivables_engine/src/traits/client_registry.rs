use crate::{
    db_types::{Client, NewClient, NewOrder, NewPaymentMethod, Order, PaymentMethod},
    traits::LedgerError,
};

/// The ledger's view of the Clients and Payment Methods subsystems.
///
/// The ledger only needs to create and look up these records. Everything else about them is owned elsewhere.
#[allow(async_fn_in_trait)]
pub trait ClientRegistry {
    async fn insert_client(&self, client: NewClient) -> Result<Client, LedgerError>;

    async fn fetch_client(&self, client_id: i64) -> Result<Option<Client>, LedgerError>;

    async fn insert_payment_method(&self, method: NewPaymentMethod) -> Result<PaymentMethod, LedgerError>;

    async fn fetch_payment_method(&self, method_id: i64) -> Result<Option<PaymentMethod>, LedgerError>;
}

/// The ledger's view of the Orders subsystem.
///
/// Orders are created with nothing paid. Only the ledger changes `paid` and `status` after that, with the single
/// exception of voiding.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Inserts a new order. Returns `ClientNotFound` if the client does not exist, or `InvalidAmount` if the total is
    /// negative.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, LedgerError>;

    /// Marks an order as `Voided`. Only orders with nothing paid against them can be voided; delete the payments
    /// first otherwise.
    async fn void_order(&self, order_id: i64) -> Result<Order, LedgerError>;
}
