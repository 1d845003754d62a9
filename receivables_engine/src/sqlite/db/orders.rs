use log::*;
use rcv_common::Money;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    traits::LedgerError,
};

/// Inserts a new order with nothing paid against it. The status is derived from the total, so zero-total orders
/// start out settled.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    if !order.total.is_valid_total() {
        return Err(LedgerError::InvalidAmount(order.total));
    }
    let status = OrderStatusType::for_amounts(Money::ZERO, order.total);
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (client_id, order_date, total, paid, status)
            VALUES ($1, $2, $3, 0, $4)
            RETURNING *;
        "#,
    )
    .bind(order.client_id)
    .bind(order.order_date)
    .bind(order.total)
    .bind(status)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{} for {} inserted for client #{}", order.id, order.total, order.client_id);
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches the client's open orders in FIFO order: oldest order date first, then lowest id.
pub async fn fetch_open_orders_for_client(
    client_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE client_id = $1 AND status IN ('Pending', 'Partial')
            ORDER BY order_date ASC, id ASC
        "#,
    )
    .bind(client_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Fetches every order the client has ever placed, in FIFO order.
pub async fn fetch_orders_for_client(client_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE client_id = $1 ORDER BY order_date ASC, id ASC")
        .bind(client_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_orders_by_ids(ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE id IN (");
    let mut list = builder.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    list.push_unseparated(") ORDER BY order_date ASC, id ASC");
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(orders)
}

/// Sets the order's `paid` amount and status, but only if `paid` still holds the value that the caller read.
///
/// Every caller holds the client's ledger lock, so a mismatch means the lock discipline has been broken somewhere and
/// is reported as a `ConcurrencyConflict`. The whole unit of work should be rolled back and retried.
pub async fn update_paid(
    order_id: i64,
    expected_paid: Money,
    paid: Money,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, LedgerError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET paid = $1, status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND paid = $4
            RETURNING *;
        "#,
    )
    .bind(paid)
    .bind(status)
    .bind(order_id)
    .bind(expected_paid)
    .fetch_optional(conn)
    .await?;
    match order {
        Some(order) => {
            trace!("🗃️ Order #{order_id} paid {expected_paid} -> {paid} ({status})");
            Ok(order)
        },
        None => {
            warn!("🗃️ Order #{order_id} no longer has {expected_paid} paid. Someone changed it underneath us.");
            Err(LedgerError::ConcurrencyConflict(format!(
                "Order #{order_id} was modified while a payment was being applied to it"
            )))
        },
    }
}

/// Marks the order as voided, provided nothing has been paid against it.
pub async fn void_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    let voided: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = 'Voided', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND paid = 0
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;
    match voided {
        Some(order) => {
            info!("🗃️ Order #{order_id} has been voided");
            Ok(order)
        },
        None => {
            let order = fetch_order(order_id, conn).await?.ok_or(LedgerError::OrderNotFound(order_id))?;
            Err(LedgerError::OrderNotVoidable { order_id, paid: order.paid })
        },
    }
}
