use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use rcv_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Nothing has been paid against the order yet.
    Pending,
    /// Some, but not all, of the order total has been paid.
    Partial,
    /// The order has been paid in full.
    Settled,
    /// The order was cancelled by the Orders subsystem. Voided orders never receive allocations.
    Voided,
}

impl OrderStatusType {
    /// The status an order should carry once `paid` out of `total` has been applied to it.
    ///
    /// A zero-total order is always settled.
    pub fn for_amounts(paid: Money, total: Money) -> Self {
        if paid >= total {
            OrderStatusType::Settled
        } else if paid.is_positive() {
            OrderStatusType::Partial
        } else {
            OrderStatusType::Pending
        }
    }

    /// Open orders are those that can still receive payment allocations.
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatusType::Pending | OrderStatusType::Partial)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Partial => write!(f, "Partial"),
            OrderStatusType::Settled => write!(f, "Settled"),
            OrderStatusType::Voided => write!(f, "Voided"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Partial" => Ok(Self::Partial),
            "Settled" => Ok(Self::Settled),
            "Voided" => Ok(Self::Voided),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Client         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    /// Incremented by every payment registration, reversal or credit application for this client.
    pub ledger_version: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
}

impl NewClient {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

//--------------------------------------     PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub name: String,
    pub kind: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaymentMethod {
    pub name: String,
    pub kind: Option<String>,
}

impl NewPaymentMethod {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), kind: None }
    }

    pub fn with_kind<S: Into<String>>(mut self, kind: S) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub order_date: DateTime<Utc>,
    pub total: Money,
    pub paid: Money,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub client_id: i64,
    pub order_date: DateTime<Utc>,
    pub total: Money,
}

impl NewOrder {
    pub fn new(client_id: i64, order_date: DateTime<Utc>, total: Money) -> Self {
        Self { client_id, order_date, total }
    }
}

//--------------------------------------        Payment        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub client_id: i64,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
    pub method_id: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A payment as submitted by a caller, before it has been recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub client_id: i64,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
    pub method_id: Option<i64>,
    pub description: Option<String>,
}

impl NewPayment {
    /// Creates a new payment dated now. Use [`Self::with_date`] to backdate it.
    pub fn new(client_id: i64, amount: Money) -> Self {
        Self { client_id, amount, payment_date: Utc::now(), method_id: None, description: None }
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.payment_date = date;
        self
    }

    pub fn with_method(mut self, method_id: i64) -> Self {
        self.method_id = Some(method_id);
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }
}

//--------------------------------------      Allocation       ---------------------------------------------------------
/// A portion of a payment applied to one order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Allocation {
    pub id: i64,
    pub payment_id: i64,
    pub order_id: i64,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}
