//! FIFO payment allocation.
//!
//! Allocation is a pure computation over a snapshot of a client's orders. The storage backend reads the snapshot
//! while holding the client's ledger lock, asks this module for a plan, and then writes the plan back out. Keeping the
//! arithmetic here means it can be tested without a database, and that every backend allocates identically.
//!
//! The rules:
//! * Only the client's open orders (`Pending` or `Partial`) are candidates. Voided and settled orders are skipped.
//! * Orders are paid strictly oldest first, by order date, with ties broken by order id.
//! * Each order receives `min(remaining, total - paid)`. Orders are never overpaid.
//! * Whatever is left once every open order is settled is the plan's `unapplied` amount.
use std::{collections::HashMap, fmt::Display, str::FromStr};

use log::*;
use rcv_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderStatusType},
    traits::LedgerError,
};

//--------------------------------------   OverpaymentPolicy   ---------------------------------------------------------
/// What to do with the part of a payment that exceeds everything the client owes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverpaymentPolicy {
    /// Record the whole payment. The excess stays on the payment as unapplied credit, which can later be applied to
    /// new orders.
    #[default]
    HoldAsCredit,
    /// Refuse payments that exceed the client's outstanding debt.
    Reject,
}

impl Display for OverpaymentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverpaymentPolicy::HoldAsCredit => write!(f, "credit"),
            OverpaymentPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for OverpaymentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" | "hold" | "hold_as_credit" => Ok(Self::HoldAsCredit),
            "reject" => Ok(Self::Reject),
            s => Err(format!("Unknown overpayment policy: {s}")),
        }
    }
}

//--------------------------------------   AllocationPlan      ---------------------------------------------------------
/// A single line of an allocation plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAllocation {
    pub order_id: i64,
    pub amount: Money,
    pub paid_before: Money,
    pub paid_after: Money,
    pub status_after: OrderStatusType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Allocation lines, in the order the orders were paid.
    pub allocations: Vec<PlannedAllocation>,
    pub unapplied: Money,
}

impl AllocationPlan {
    pub fn applied(&self) -> Money {
        self.allocations.iter().map(|a| a.amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    /// Applies the plan to an in-memory copy of the orders it was computed from.
    pub fn apply_to(&self, orders: &mut [Order]) {
        let lines = self.allocations.iter().map(|a| (a.order_id, a)).collect::<HashMap<_, _>>();
        for order in orders.iter_mut() {
            if let Some(line) = lines.get(&order.id) {
                order.paid = line.paid_after;
                order.status = line.status_after;
            }
        }
    }

    /// Checks the plan against `policy`. A plan with unapplied money is only acceptable when the excess can be held
    /// as credit.
    pub fn enforce(&self, policy: OverpaymentPolicy, amount: Money) -> Result<(), LedgerError> {
        if self.unapplied.is_positive() && policy == OverpaymentPolicy::Reject {
            return Err(LedgerError::Overpayment { amount, outstanding: self.applied() });
        }
        Ok(())
    }
}

/// Plans how `amount` is distributed across the open orders of `client_id`.
///
/// `orders` may be in any order and may contain closed orders or orders of other clients; only the client's open
/// orders with a positive balance are considered. Returns `InvalidAmount` if the amount is not in `1..=MAX_AMOUNT` and
/// `ConsistencyViolation` if an open order's `paid` is outside `0..=total`.
pub fn plan_allocations(client_id: i64, amount: Money, orders: &[Order]) -> Result<AllocationPlan, LedgerError> {
    if !amount.is_valid_payment() {
        return Err(LedgerError::InvalidAmount(amount));
    }
    let mut queue = orders.iter().filter(|o| o.client_id == client_id && o.is_open()).collect::<Vec<_>>();
    queue.sort_by(|a, b| a.order_date.cmp(&b.order_date).then(a.id.cmp(&b.id)));
    let mut remaining = amount;
    let mut allocations = Vec::new();
    for order in queue {
        if !remaining.is_positive() {
            break;
        }
        if order.paid.is_negative() || order.paid > order.total {
            error!(
                "🧮️ Order #{} has {} paid against a total of {}. Refusing to allocate against it.",
                order.id, order.paid, order.total
            );
            return Err(LedgerError::ConsistencyViolation(format!(
                "Order #{} has paid {} outside of 0..={}",
                order.id, order.paid, order.total
            )));
        }
        let debt = order.total - order.paid;
        if !debt.is_positive() {
            continue;
        }
        let applied = remaining.min(debt);
        let paid_after = order.paid + applied;
        let status_after = OrderStatusType::for_amounts(paid_after, order.total);
        trace!("🧮️ Allocating {applied} to order #{}. Paid {} -> {paid_after}", order.id, order.paid);
        allocations.push(PlannedAllocation {
            order_id: order.id,
            amount: applied,
            paid_before: order.paid,
            paid_after,
            status_after,
        });
        remaining -= applied;
    }
    Ok(AllocationPlan { allocations, unapplied: remaining })
}

//--------------------------------------     Credit plans      ---------------------------------------------------------
/// Unapplied money left on an earlier payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditSource {
    pub payment_id: i64,
    pub available: Money,
}

/// Plans how held credit is applied to open orders. `credits` are consumed in the given order, so the caller should
/// pass them oldest payment first. Each credit source that ends up applying something gets its own plan.
pub fn plan_credit_application(
    client_id: i64,
    credits: &[CreditSource],
    orders: &[Order],
) -> Result<Vec<(i64, AllocationPlan)>, LedgerError> {
    let mut working = orders.to_vec();
    let mut plans = Vec::new();
    for credit in credits.iter().filter(|c| c.available.is_positive()) {
        let plan = plan_allocations(client_id, credit.available, &working)?;
        if plan.is_empty() {
            break;
        }
        plan.apply_to(&mut working);
        plans.push((credit.payment_id, plan));
    }
    Ok(plans)
}
