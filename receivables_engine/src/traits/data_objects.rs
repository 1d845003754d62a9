use chrono::{DateTime, Utc};
use rcv_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::{Allocation, Client, Order, OrderStatusType, Payment};

/// The outcome of registering a payment: the stored payment, the allocations it created, and the orders it touched
/// (in their post-allocation state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub payment: Payment,
    pub allocations: Vec<Allocation>,
    pub orders: Vec<Order>,
    /// The part of the payment that did not fit on any open order and is held as client credit.
    pub unapplied: Money,
}

impl PaymentAllocation {
    pub fn applied(&self) -> Money {
        self.allocations.iter().map(|a| a.amount).sum()
    }

    /// The orders that this payment brought to the `Settled` state.
    pub fn settled_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.status == OrderStatusType::Settled)
    }
}

/// The outcome of deleting a payment: the payment as it was, the allocations that were removed, and the orders
/// that were restored (in their post-reversal state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReversal {
    pub payment: Payment,
    pub allocations: Vec<Allocation>,
    pub orders: Vec<Order>,
}

impl PaymentReversal {
    pub fn reversed(&self) -> Money {
        self.allocations.iter().map(|a| a.amount).sum()
    }
}

/// The outcome of applying a client's held credit to their open orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditApplication {
    pub client_id: i64,
    pub allocations: Vec<Allocation>,
    pub orders: Vec<Order>,
    /// Credit the client still holds after the application.
    pub remaining_credit: Money,
}

impl CreditApplication {
    pub fn applied(&self) -> Money {
        self.allocations.iter().map(|a| a.amount).sum()
    }
}

/// An open order joined with the name of the client that owes it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ReceivableOrder {
    #[sqlx(flatten)]
    pub order: Order,
    pub client_name: String,
}

/// A row of the payment history report.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentHistoryEntry {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub amount: Money,
    pub applied: Money,
    pub payment_date: DateTime<Utc>,
    pub method_id: Option<i64>,
    pub method_name: Option<String>,
    pub description: Option<String>,
}

/// Every ledger record belonging to one client, read from a single consistent snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientLedger {
    pub client: Client,
    pub orders: Vec<Order>,
    pub payments: Vec<Payment>,
    pub allocations: Vec<Allocation>,
}
