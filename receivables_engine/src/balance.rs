//! Balance projection.
//!
//! Everything here is a pure function of ledger records that were read from one consistent snapshot. Nothing in
//! this module touches storage.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::*;
use rcv_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    allocation::CreditSource,
    db_types::{Allocation, Order, OrderStatusType, Payment},
    traits::{ClientLedger, LedgerError, ReceivableOrder},
};

/// What the client still owes on this order.
pub fn order_debt(order: &Order) -> Money {
    order.total - order.paid
}

/// Receivable orders are non-voided orders with a positive debt.
pub fn is_receivable(order: &Order) -> bool {
    order.status != OrderStatusType::Voided && order_debt(order).is_positive()
}

pub fn client_debt(orders: &[Order]) -> Money {
    orders.iter().filter(|o| is_receivable(o)).map(order_debt).sum()
}

pub fn oldest_open_date(orders: &[Order]) -> Option<DateTime<Utc>> {
    orders.iter().filter(|o| is_receivable(o)).map(|o| o.order_date).min()
}

/// One row of the accounts-receivable report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientReceivable {
    pub client_id: i64,
    pub client_name: String,
    pub total_debt: Money,
    pub open_order_count: usize,
    pub oldest_open_date: DateTime<Utc>,
}

/// Groups receivable orders by client. Clients with the oldest outstanding order come first.
pub fn summarize_receivables(orders: &[ReceivableOrder]) -> Vec<ClientReceivable> {
    let mut by_client: HashMap<i64, ClientReceivable> = HashMap::new();
    for ReceivableOrder { order, client_name } in orders.iter().filter(|r| is_receivable(&r.order)) {
        let entry = by_client.entry(order.client_id).or_insert_with(|| ClientReceivable {
            client_id: order.client_id,
            client_name: client_name.clone(),
            total_debt: Money::ZERO,
            open_order_count: 0,
            oldest_open_date: order.order_date,
        });
        entry.total_debt += order_debt(order);
        entry.open_order_count += 1;
        entry.oldest_open_date = entry.oldest_open_date.min(order.order_date);
    }
    let mut result = by_client.into_values().collect::<Vec<_>>();
    result.sort_by(|a, b| a.oldest_open_date.cmp(&b.oldest_open_date).then(a.client_id.cmp(&b.client_id)));
    result
}

/// An open order as shown to someone deciding how much a client still owes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrderLine {
    pub order_id: i64,
    pub order_date: DateTime<Utc>,
    pub total: Money,
    pub paid: Money,
    pub balance: Money,
    pub status: OrderStatusType,
}

impl From<&Order> for OpenOrderLine {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            order_date: order.order_date,
            total: order.total,
            paid: order.paid,
            balance: order_debt(order),
            status: order.status,
        }
    }
}

/// Sum of allocations per payment id.
fn allocated_by_payment(allocations: &[Allocation]) -> HashMap<i64, Money> {
    let mut result = HashMap::new();
    for a in allocations {
        *result.entry(a.payment_id).or_insert(Money::ZERO) += a.amount;
    }
    result
}

/// Payments that still hold money not allocated to any order, oldest payment first.
pub fn unapplied_credit(payments: &[Payment], allocations: &[Allocation]) -> Vec<CreditSource> {
    let allocated = allocated_by_payment(allocations);
    let mut payments = payments.iter().collect::<Vec<_>>();
    payments.sort_by(|a, b| a.payment_date.cmp(&b.payment_date).then(a.id.cmp(&b.id)));
    payments
        .into_iter()
        .filter_map(|p| {
            let applied = allocated.get(&p.id).copied().unwrap_or_default();
            let available = p.amount - applied;
            available.is_positive().then_some(CreditSource { payment_id: p.id, available })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBalance {
    pub client_id: i64,
    pub client_name: String,
    pub total_debt: Money,
    pub open_order_count: usize,
    pub oldest_open_date: Option<DateTime<Utc>>,
    pub unapplied_credit: Money,
}

pub fn client_balance(ledger: &ClientLedger) -> ClientBalance {
    let unapplied = unapplied_credit(&ledger.payments, &ledger.allocations);
    ClientBalance {
        client_id: ledger.client.id,
        client_name: ledger.client.name.clone(),
        total_debt: client_debt(&ledger.orders),
        open_order_count: ledger.orders.iter().filter(|o| is_receivable(o)).count(),
        oldest_open_date: oldest_open_date(&ledger.orders),
        unapplied_credit: unapplied.iter().map(|c| c.available).sum(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAudit {
    pub client_id: i64,
    pub consistent: bool,
}

/// Checks every invariant that ties a client's orders, payments and allocations together. The first problem found
/// is reported as a `ConsistencyViolation`; every problem is logged.
pub fn audit_client_ledger(ledger: &ClientLedger) -> Result<LedgerAudit, LedgerError> {
    let client_id = ledger.client.id;
    let mut problems = Vec::new();
    let orders = ledger.orders.iter().map(|o| (o.id, o)).collect::<HashMap<_, _>>();
    let payments = ledger.payments.iter().map(|p| (p.id, p)).collect::<HashMap<_, _>>();

    let mut allocated_to_order: HashMap<i64, Money> = HashMap::new();
    for a in &ledger.allocations {
        if !a.amount.is_positive() {
            problems.push(format!("Allocation #{} has a non-positive amount of {}", a.id, a.amount));
        }
        if !orders.contains_key(&a.order_id) {
            problems.push(format!(
                "Allocation #{} points at order #{}, which is not client #{client_id}'s",
                a.id, a.order_id
            ));
        }
        if !payments.contains_key(&a.payment_id) {
            problems.push(format!(
                "Allocation #{} belongs to payment #{}, which is not client #{client_id}'s",
                a.id, a.payment_id
            ));
        }
        *allocated_to_order.entry(a.order_id).or_insert(Money::ZERO) += a.amount;
    }

    for order in &ledger.orders {
        let allocated = allocated_to_order.get(&order.id).copied().unwrap_or_default();
        if allocated != order.paid {
            problems.push(format!(
                "Order #{} records {} paid, but its allocations sum to {allocated}",
                order.id, order.paid
            ));
        }
        if order.paid.is_negative() || order.paid > order.total {
            problems.push(format!("Order #{} has {} paid against a total of {}", order.id, order.paid, order.total));
        }
        let expected = OrderStatusType::for_amounts(order.paid, order.total);
        if order.status != OrderStatusType::Voided && order.status != expected {
            problems.push(format!("Order #{} is {} but should be {expected}", order.id, order.status));
        }
    }

    let allocated = allocated_by_payment(&ledger.allocations);
    for payment in &ledger.payments {
        let applied = allocated.get(&payment.id).copied().unwrap_or_default();
        if applied > payment.amount {
            problems.push(format!(
                "Payment #{} of {} has {applied} allocated to orders",
                payment.id, payment.amount
            ));
        }
    }

    if problems.is_empty() {
        debug!("🧮️ Ledger for client #{client_id} is consistent");
        return Ok(LedgerAudit { client_id, consistent: true });
    }
    for problem in &problems {
        error!("🧮️ Ledger audit for client #{client_id}: {problem}");
    }
    Err(LedgerError::ConsistencyViolation(problems.swap_remove(0)))
}
