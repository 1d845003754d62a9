use mockall::mock;
use receivables_engine::{
    db_types::{Allocation, NewPayment, Order, Payment},
    traits::{
        ClientLedger,
        CreditApplication,
        LedgerDatabase,
        LedgerError,
        PaymentAllocation,
        PaymentHistoryEntry,
        PaymentReversal,
        ReceivableOrder,
        ReceivablesManagement,
    },
    OverpaymentPolicy,
};

mock! {
    pub Ledger {}
    impl Clone for Ledger {
        fn clone(&self) -> Self;
    }
    impl LedgerDatabase for Ledger {
        fn url(&self) -> &str;
        async fn register_payment(&self, payment: NewPayment, policy: OverpaymentPolicy) -> Result<PaymentAllocation, LedgerError>;
        async fn delete_payment(&self, payment_id: i64) -> Result<PaymentReversal, LedgerError>;
        async fn apply_client_credit(&self, client_id: i64) -> Result<CreditApplication, LedgerError>;
    }
}

mock! {
    pub Receivables {}
    impl ReceivablesManagement for Receivables {
        async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, LedgerError>;
        async fn fetch_payment_detail(&self, payment_id: i64) -> Result<Option<(Payment, Vec<Allocation>)>, LedgerError>;
        async fn fetch_allocations_for_order(&self, order_id: i64) -> Result<Vec<Allocation>, LedgerError>;
        async fn fetch_open_orders_for_client(&self, client_id: i64) -> Result<Vec<Order>, LedgerError>;
        async fn fetch_receivable_orders(&self) -> Result<Vec<ReceivableOrder>, LedgerError>;
        async fn fetch_payment_history(&self, limit: i64) -> Result<Vec<PaymentHistoryEntry>, LedgerError>;
        async fn fetch_client_ledger(&self, client_id: i64) -> Result<Option<ClientLedger>, LedgerError>;
    }
}
