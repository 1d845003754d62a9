//! `SqliteDatabase` is a concrete implementation of a receivables ledger backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! Every mutating method opens a transaction whose first statement locks the affected client's ledger (see
//! [`clients::lock_ledger`]). Reads that must be mutually consistent run inside a single transaction so that they
//! share one snapshot.
//!
//! [`traits`]: crate::traits
use std::{fmt::Debug, time::Duration};

use log::*;
use rcv_common::Money;
use sqlx::{migrate, SqliteConnection, SqlitePool};

use super::db::{
    allocations,
    clients,
    new_pool,
    orders,
    payment_methods,
    payments,
    receivables,
    DEFAULT_BUSY_TIMEOUT,
};
use crate::{
    allocation::{plan_allocations, plan_credit_application, AllocationPlan, OverpaymentPolicy},
    balance::unapplied_credit,
    db_types::{Allocation, Client, NewClient, NewOrder, NewPayment, NewPaymentMethod, Order, Payment, PaymentMethod},
    reversal::plan_reversal,
    traits::{
        ClientLedger,
        ClientRegistry,
        CreditApplication,
        LedgerDatabase,
        LedgerError,
        OrderManagement,
        PaymentAllocation,
        PaymentHistoryEntry,
        PaymentReversal,
        ReceivableOrder,
        ReceivablesManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        SqliteDatabase::new_with_options(url, max_connections, DEFAULT_BUSY_TIMEOUT).await
    }

    pub async fn new_with_options(url: &str, max_connections: u32, busy_timeout: Duration) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections, busy_timeout).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), LedgerError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}

/// Writes an allocation plan for `payment_id`: one allocation row and one conditional order update per line.
async fn write_plan(
    payment_id: i64,
    plan: &AllocationPlan,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Allocation>, Vec<Order>), LedgerError> {
    let mut allocations = Vec::with_capacity(plan.allocations.len());
    let mut updated = Vec::with_capacity(plan.allocations.len());
    for line in &plan.allocations {
        let allocation = allocations::insert_allocation(payment_id, line.order_id, line.amount, &mut *conn).await?;
        let order =
            orders::update_paid(line.order_id, line.paid_before, line.paid_after, line.status_after, &mut *conn)
                .await?;
        allocations.push(allocation);
        updated.push(order);
    }
    Ok((allocations, updated))
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn register_payment(
        &self,
        payment: NewPayment,
        policy: OverpaymentPolicy,
    ) -> Result<PaymentAllocation, LedgerError> {
        if !payment.amount.is_valid_payment() {
            return Err(LedgerError::InvalidAmount(payment.amount));
        }
        let client_id = payment.client_id;
        let amount = payment.amount;
        let mut tx = self.pool.begin().await?;
        clients::lock_ledger(client_id, &mut tx).await?;
        if let Some(method_id) = payment.method_id {
            payment_methods::fetch_payment_method(method_id, &mut tx)
                .await?
                .ok_or(LedgerError::PaymentMethodNotFound(method_id))?;
        }
        let open_orders = orders::fetch_open_orders_for_client(client_id, &mut tx).await?;
        trace!("🗃️ Client #{client_id} has {} open orders", open_orders.len());
        let plan = plan_allocations(client_id, amount, &open_orders)?;
        plan.enforce(policy, amount)?;
        let payment = payments::insert_payment(payment, &mut tx).await?;
        let (allocations, orders) = write_plan(payment.id, &plan, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Payment #{} of {amount} for client #{client_id} allocated across {} orders",
            payment.id,
            allocations.len()
        );
        if plan.unapplied.is_positive() {
            info!("🗃️ {} of payment #{} is held as credit for client #{client_id}", plan.unapplied, payment.id);
        }
        Ok(PaymentAllocation { payment, allocations, orders, unapplied: plan.unapplied })
    }

    async fn delete_payment(&self, payment_id: i64) -> Result<PaymentReversal, LedgerError> {
        let mut tx = self.pool.begin().await?;
        clients::lock_ledger_for_payment(payment_id, &mut tx).await?;
        let payment =
            payments::fetch_payment(payment_id, &mut tx).await?.ok_or(LedgerError::PaymentNotFound(payment_id))?;
        let allocations = allocations::fetch_allocations_for_payment(payment_id, &mut tx).await?;
        let mut order_ids = allocations.iter().map(|a| a.order_id).collect::<Vec<_>>();
        order_ids.sort_unstable();
        order_ids.dedup();
        let affected = orders::fetch_orders_by_ids(&order_ids, &mut tx).await?;
        let plan = plan_reversal(&allocations, &affected)?;
        let mut restored = Vec::with_capacity(plan.reversals.len());
        for line in &plan.reversals {
            let order =
                orders::update_paid(line.order_id, line.paid_before, line.paid_after, line.status_after, &mut tx)
                    .await?;
            restored.push(order);
        }
        let removed = allocations::delete_allocations_for_payment(payment_id, &mut tx).await?;
        payments::delete_payment(payment_id, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Payment #{payment_id} deleted. {removed} allocations totalling {} reversed",
            plan.reversed()
        );
        Ok(PaymentReversal { payment, allocations, orders: restored })
    }

    async fn apply_client_credit(&self, client_id: i64) -> Result<CreditApplication, LedgerError> {
        let mut tx = self.pool.begin().await?;
        clients::lock_ledger(client_id, &mut tx).await?;
        let client_payments = payments::fetch_payments_for_client(client_id, &mut tx).await?;
        let client_allocations = allocations::fetch_allocations_for_client(client_id, &mut tx).await?;
        let credits = unapplied_credit(&client_payments, &client_allocations);
        let available: Money = credits.iter().map(|c| c.available).sum();
        let open_orders = orders::fetch_open_orders_for_client(client_id, &mut tx).await?;
        let plans = plan_credit_application(client_id, &credits, &open_orders)?;
        let mut allocations = Vec::new();
        let mut touched: Vec<Order> = Vec::new();
        for (payment_id, plan) in &plans {
            let (mut new_allocations, updated) = write_plan(*payment_id, plan, &mut tx).await?;
            allocations.append(&mut new_allocations);
            for order in updated {
                match touched.iter_mut().find(|o| o.id == order.id) {
                    Some(existing) => *existing = order,
                    None => touched.push(order),
                }
            }
        }
        tx.commit().await?;
        let applied: Money = allocations.iter().map(|a| a.amount).sum();
        debug!("🗃️ Applied {applied} of {available} held credit for client #{client_id}");
        Ok(CreditApplication { client_id, allocations, orders: touched, remaining_credit: available - applied })
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl ReceivablesManagement for SqliteDatabase {
    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_detail(&self, payment_id: i64) -> Result<Option<(Payment, Vec<Allocation>)>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let payment = match payments::fetch_payment(payment_id, &mut tx).await? {
            Some(p) => p,
            None => return Ok(None),
        };
        let allocations = allocations::fetch_allocations_for_payment(payment_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Some((payment, allocations)))
    }

    async fn fetch_allocations_for_order(&self, order_id: i64) -> Result<Vec<Allocation>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let allocations = allocations::fetch_allocations_for_order(order_id, &mut conn).await?;
        Ok(allocations)
    }

    async fn fetch_open_orders_for_client(&self, client_id: i64) -> Result<Vec<Order>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        clients::fetch_client(client_id, &mut tx).await?.ok_or(LedgerError::ClientNotFound(client_id))?;
        let orders = orders::fetch_open_orders_for_client(client_id, &mut tx).await?;
        tx.commit().await?;
        Ok(orders)
    }

    async fn fetch_receivable_orders(&self) -> Result<Vec<ReceivableOrder>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = receivables::fetch_receivable_orders(&mut conn).await?;
        Ok(orders)
    }

    async fn fetch_payment_history(&self, limit: i64) -> Result<Vec<PaymentHistoryEntry>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let history = receivables::fetch_payment_history(limit, &mut conn).await?;
        Ok(history)
    }

    async fn fetch_client_ledger(&self, client_id: i64) -> Result<Option<ClientLedger>, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let client = match clients::fetch_client(client_id, &mut tx).await? {
            Some(c) => c,
            None => return Ok(None),
        };
        let orders = orders::fetch_orders_for_client(client_id, &mut tx).await?;
        let payments = payments::fetch_payments_for_client(client_id, &mut tx).await?;
        let allocations = allocations::fetch_allocations_for_client(client_id, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(ClientLedger { client, orders, payments, allocations }))
    }
}

impl ClientRegistry for SqliteDatabase {
    async fn insert_client(&self, client: NewClient) -> Result<Client, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        clients::insert_client(client, &mut conn).await
    }

    async fn fetch_client(&self, client_id: i64) -> Result<Option<Client>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let client = clients::fetch_client(client_id, &mut conn).await?;
        Ok(client)
    }

    async fn insert_payment_method(&self, method: NewPaymentMethod) -> Result<PaymentMethod, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        payment_methods::insert_payment_method(method, &mut conn).await
    }

    async fn fetch_payment_method(&self, method_id: i64) -> Result<Option<PaymentMethod>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let method = payment_methods::fetch_payment_method(method_id, &mut conn).await?;
        Ok(method)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, LedgerError> {
        let mut tx = self.pool.begin().await?;
        clients::lock_ledger(order.client_id, &mut tx).await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn void_order(&self, order_id: i64) -> Result<Order, LedgerError> {
        let mut tx = self.pool.begin().await?;
        clients::lock_ledger_for_order(order_id, &mut tx).await?;
        let order = orders::void_order(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }
}
