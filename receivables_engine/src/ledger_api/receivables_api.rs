//! Read-only reports over the receivables ledger.
use std::fmt::Debug;

use log::*;
use rcv_common::Money;
use serde::{Deserialize, Serialize};

use crate::{
    balance::{self, ClientBalance, ClientReceivable, LedgerAudit, OpenOrderLine},
    db_types::{Allocation, Payment},
    traits::{LedgerError, PaymentHistoryEntry, ReceivablesManagement},
};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 500;

/// A payment together with the allocations it made and whatever it still holds as credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetail {
    pub payment: Payment,
    pub allocations: Vec<Allocation>,
    pub unapplied: Money,
}

/// The `ReceivablesApi` answers the question "who owes us what?".
pub struct ReceivablesApi<B> {
    db: B,
    history_limit: i64,
}

impl<B: Debug> Debug for ReceivablesApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReceivablesApi ({:?})", self.db)
    }
}

impl<B> ReceivablesApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, history_limit: DEFAULT_HISTORY_LIMIT }
    }

    /// Sets the number of payments returned by [`Self::payment_history`] when the caller does not ask for a specific
    /// number.
    pub fn with_history_limit(mut self, limit: i64) -> Self {
        self.history_limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        self
    }
}

impl<B> ReceivablesApi<B>
where B: ReceivablesManagement
{
    /// The most recent payments, newest first. `limit` is clamped to `1..=500`.
    pub async fn payment_history(&self, limit: Option<i64>) -> Result<Vec<PaymentHistoryEntry>, LedgerError> {
        let limit = limit.unwrap_or(self.history_limit).clamp(1, MAX_HISTORY_LIMIT);
        trace!("📊️ Fetching the last {limit} payments");
        self.db.fetch_payment_history(limit).await
    }

    /// Every client that owes money, with their total debt, number of open orders and the date of their oldest
    /// unpaid order.
    pub async fn accounts_receivable(&self) -> Result<Vec<ClientReceivable>, LedgerError> {
        let orders = self.db.fetch_receivable_orders().await?;
        let accounts = balance::summarize_receivables(&orders);
        debug!("📊️ {} clients have {} open orders between them", accounts.len(), orders.len());
        Ok(accounts)
    }

    /// The client's open orders in the order payments will be applied to them.
    pub async fn open_orders(&self, client_id: i64) -> Result<Vec<OpenOrderLine>, LedgerError> {
        let orders = self.db.fetch_open_orders_for_client(client_id).await?;
        Ok(orders.iter().map(OpenOrderLine::from).collect())
    }

    pub async fn payment_detail(&self, payment_id: i64) -> Result<PaymentDetail, LedgerError> {
        let (payment, allocations) =
            self.db.fetch_payment_detail(payment_id).await?.ok_or(LedgerError::PaymentNotFound(payment_id))?;
        let applied: Money = allocations.iter().map(|a| a.amount).sum();
        let unapplied = payment.amount - applied;
        Ok(PaymentDetail { payment, allocations, unapplied })
    }

    pub async fn client_balance(&self, client_id: i64) -> Result<ClientBalance, LedgerError> {
        let ledger = self.db.fetch_client_ledger(client_id).await?.ok_or(LedgerError::ClientNotFound(client_id))?;
        Ok(balance::client_balance(&ledger))
    }

    /// Recomputes every order's paid amount and status from the allocation records and checks them against what is
    /// stored. Any mismatch is returned as a `ConsistencyViolation`.
    pub async fn verify_client_ledger(&self, client_id: i64) -> Result<LedgerAudit, LedgerError> {
        let ledger = self.db.fetch_client_ledger(client_id).await?.ok_or(LedgerError::ClientNotFound(client_id))?;
        balance::audit_client_ledger(&ledger)
    }
}
