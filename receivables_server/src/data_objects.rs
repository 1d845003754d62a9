use std::fmt::Display;

use chrono::{DateTime, Utc};
use receivables_engine::db_types::{Money, NewPayment};
use serde::{Deserialize, Serialize};

/// The body of a `POST /api/payment` request. `date` defaults to the time the request is received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPaymentRequest {
    pub client_id: i64,
    pub amount: Money,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub method_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<RegisterPaymentRequest> for NewPayment {
    fn from(req: RegisterPaymentRequest) -> Self {
        let mut payment = NewPayment::new(req.client_id, req.amount);
        if let Some(date) = req.date {
            payment = payment.with_date(date);
        }
        if let Some(method_id) = req.method_id {
            payment = payment.with_method(method_id);
        }
        if let Some(description) = req.description {
            payment = payment.with_description(description);
        }
        payment
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}
