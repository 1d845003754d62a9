//! Payment reversal.
//!
//! Deleting a payment undoes exactly the allocations it created: each affected order loses the allocated amount
//! from `paid`, and its status is re-derived. Like allocation, the arithmetic is a pure function of a snapshot that
//! the backend reads under the client's ledger lock.
use std::collections::HashMap;

use log::*;
use rcv_common::Money;

use crate::{
    db_types::{Allocation, Order, OrderStatusType},
    traits::LedgerError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReversal {
    pub order_id: i64,
    /// Sum of every allocation the payment made to this order.
    pub amount: Money,
    pub paid_before: Money,
    pub paid_after: Money,
    pub status_after: OrderStatusType,
    /// True if the order had less paid than the payment allocated to it and `paid_after` was floored at zero.
    pub floored: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReversalPlan {
    /// One line per affected order, in the order the payment first allocated to them.
    pub reversals: Vec<PlannedReversal>,
}

impl ReversalPlan {
    pub fn reversed(&self) -> Money {
        self.reversals.iter().map(|r| r.amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.reversals.is_empty()
    }
}

/// Plans the reversal of `allocations`, which must all belong to the payment being deleted. `orders` must contain
/// every order those allocations point at.
///
/// A payment may have allocated to the same order more than once (when held credit is applied after an earlier
/// reversal reopened the order), so allocations are summed per order before being subtracted.
pub fn plan_reversal(allocations: &[Allocation], orders: &[Order]) -> Result<ReversalPlan, LedgerError> {
    let by_id = orders.iter().map(|o| (o.id, o)).collect::<HashMap<_, _>>();
    let mut totals: Vec<(i64, Money)> = Vec::new();
    for allocation in allocations {
        if !allocation.amount.is_positive() {
            return Err(LedgerError::ConsistencyViolation(format!(
                "Allocation #{} has a non-positive amount of {}",
                allocation.id, allocation.amount
            )));
        }
        match totals.iter_mut().find(|(id, _)| *id == allocation.order_id) {
            Some((_, total)) => *total += allocation.amount,
            None => totals.push((allocation.order_id, allocation.amount)),
        }
    }
    let mut reversals = Vec::with_capacity(totals.len());
    for (order_id, amount) in totals {
        let order = by_id.get(&order_id).ok_or(LedgerError::OrderNotFound(order_id))?;
        let floored = order.paid < amount;
        if floored {
            error!(
                "🧮️ Reversing {amount} from order #{order_id}, but only {} is recorded as paid. The order's paid \
                 amount will be floored at zero. The ledger for client #{} needs to be audited.",
                order.paid, order.client_id
            );
        }
        let paid_after = order.paid.saturating_sub_floor(amount);
        let status_after = match order.status {
            OrderStatusType::Voided => OrderStatusType::Voided,
            _ => OrderStatusType::for_amounts(paid_after, order.total),
        };
        trace!("🧮️ Reversing {amount} from order #{order_id}. Paid {} -> {paid_after}", order.paid);
        reversals.push(PlannedReversal {
            order_id,
            amount,
            paid_before: order.paid,
            paid_after,
            status_after,
            floored,
        });
    }
    Ok(ReversalPlan { reversals })
}
