pub mod payment_flow_api;
pub mod receivables_api;
pub mod retry;
