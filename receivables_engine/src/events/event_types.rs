use serde::{Deserialize, Serialize};

use crate::db_types::{Allocation, Order, Payment};

/// Published once a payment has been recorded and allocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRegisteredEvent {
    pub payment: Payment,
    pub allocations: Vec<Allocation>,
}

impl PaymentRegisteredEvent {
    pub fn new(payment: Payment, allocations: Vec<Allocation>) -> Self {
        Self { payment, allocations }
    }
}

/// Published for every order that a payment or a credit application brought to `Settled`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettledEvent {
    pub order: Order,
}

impl OrderSettledEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Published once a payment has been deleted. `orders` holds the affected orders in their restored state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReversedEvent {
    pub payment: Payment,
    pub orders: Vec<Order>,
}

impl PaymentReversedEvent {
    pub fn new(payment: Payment, orders: Vec<Order>) -> Self {
        Self { payment, orders }
    }
}
