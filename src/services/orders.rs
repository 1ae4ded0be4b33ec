//! Order lifecycle service: the only code path that writes an order's
//! status column.
//!
//! Every operation here is one transaction: the status-guarded update and
//! its history row commit together or not at all. Concurrent callers racing
//! on the same order serialize on the `FOR UPDATE` row lock, and the write
//! itself is additionally guarded by `WHERE status = <expected>` so a stale
//! check can never slip through.

use chrono::Utc;
use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Actor, LifecycleEvent, Order, OrderStatus, PaymentMethod};
use crate::error::{AppError, Result};
use crate::services::notify;
use crate::AppState;

pub struct NewOrderInput {
    pub delivery_city: String,
    pub delivery_commune: Option<String>,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub payment_method: PaymentMethod,
}

pub(crate) async fn insert_history(
    conn: &mut PgConnection,
    order_id: Uuid,
    from: Option<OrderStatus>,
    to: OrderStatus,
    actor_id: Option<Uuid>,
    note: Option<&str>,
    visible_to_client: bool,
) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO order_status_history
             (id, order_id, from_status, to_status, note, actor_id, visible_to_client)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::now_v7())
    .bind(order_id)
    .bind(from)
    .bind(to)
    .bind(note)
    .bind(actor_id)
    .bind(visible_to_client)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Lock an order row for the remainder of the transaction.
pub(crate) async fn lock_order(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
) -> Result<Order> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))
}

/// Status-guarded write plus its history row. Callers must hold the row
/// lock and have validated the transition already; the guard is the last
/// line of defense against a concurrent writer.
pub(crate) async fn apply_transition(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
    to: OrderStatus,
    actor_id: Option<Uuid>,
    note: Option<&str>,
) -> Result<Order> {
    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $3, updated_at = NOW()
         WHERE id = $1 AND status = $2 RETURNING *",
    )
    .bind(order.id)
    .bind(order.status)
    .bind(to)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::InvalidTransition {
        from: order.status.as_str(),
        to: to.as_str(),
    })?;

    insert_history(
        tx,
        order.id,
        Some(order.status),
        to,
        actor_id,
        note,
        to.is_client_visible(),
    )
    .await?;

    Ok(updated)
}

/// Validate and perform one status transition on behalf of `actor`.
pub async fn request_transition(
    state: &AppState,
    order_id: Uuid,
    target: OrderStatus,
    actor: &Actor,
    note: Option<&str>,
) -> Result<Order> {
    let mut tx = state.db.begin().await?;

    let order = lock_order(&mut tx, order_id).await?;
    if !OrderStatus::can_transition(order.status, target) {
        return Err(AppError::InvalidTransition {
            from: order.status.as_str(),
            to: target.as_str(),
        });
    }

    let updated = apply_transition(&mut tx, &order, target, Some(actor.id), note).await?;
    tx.commit().await?;

    tracing::info!(
        order = %updated.order_number,
        from = order.status.as_str(),
        to = target.as_str(),
        actor = %actor.id,
        "order status changed"
    );
    notify::publish(
        state,
        &LifecycleEvent::OrderStatusChanged {
            order_id: updated.id,
            order_number: updated.order_number.clone(),
            from: order.status,
            to: target,
        },
    )
    .await;

    Ok(updated)
}

/// Convert the actor's cart into an order in `PENDING_PAYMENT`.
///
/// Cart rows are consumed atomically with the order creation, and the
/// initial history entry (`from_status` NULL) is written in the same
/// transaction.
pub async fn create_order(state: &AppState, actor: &Actor, input: NewOrderInput) -> Result<Order> {
    #[derive(sqlx::FromRow)]
    struct CartLine {
        product_id: Uuid,
        quantity: i32,
        sale_price: i64,
    }

    let mut tx = state.db.begin().await?;

    let lines = sqlx::query_as::<_, CartLine>(
        "SELECT ci.product_id, ci.quantity, p.sale_price
         FROM cart_items ci JOIN products p ON p.id = ci.product_id
         WHERE ci.user_id = $1",
    )
    .bind(actor.id)
    .fetch_all(&mut *tx)
    .await?;

    if lines.is_empty() {
        return Err(AppError::Precondition("cart is empty".into()));
    }

    let subtotal: i64 = lines
        .iter()
        .map(|l| l.sale_price * i64::from(l.quantity))
        .sum();
    let total = subtotal + state.shipping_fee;
    let order_number = format!("AB-{}", Utc::now().timestamp_millis());

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders
             (id, order_number, user_id, status, subtotal, shipping_cost, total,
              delivery_city, delivery_commune, delivery_address, delivery_phone,
              payment_method, payment_status)
         VALUES ($1, $2, $3, 'PENDING_PAYMENT', $4, $5, $6, $7, $8, $9, $10, $11, 'PENDING')
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&order_number)
    .bind(actor.id)
    .bind(subtotal)
    .bind(state.shipping_fee)
    .bind(total)
    .bind(&input.delivery_city)
    .bind(&input.delivery_commune)
    .bind(&input.delivery_address)
    .bind(&input.delivery_phone)
    .bind(input.payment_method)
    .fetch_one(&mut *tx)
    .await?;

    for line in &lines {
        sqlx::query(
            "INSERT INTO order_items (id, order_id, product_id, quantity, price)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.sale_price)
        .execute(&mut *tx)
        .await?;
    }

    insert_history(
        &mut tx,
        order.id,
        None,
        OrderStatus::PendingPayment,
        Some(actor.id),
        None,
        false,
    )
    .await?;

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(actor.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(order = %order.order_number, total, "order created");
    notify::publish(
        state,
        &LifecycleEvent::OrderCreated {
            order_id: order.id,
            order_number: order.order_number.clone(),
        },
    )
    .await;

    Ok(order)
}

/// Full audit trail for staff, or the client-visible slice for customers.
pub async fn history(
    state: &AppState,
    order_id: Uuid,
    client_view: bool,
) -> Result<Vec<crate::domain::OrderStatusHistory>> {
    let rows = sqlx::query_as::<_, crate::domain::OrderStatusHistory>(
        "SELECT * FROM order_status_history
         WHERE order_id = $1 AND (NOT $2 OR visible_to_client)
         ORDER BY created_at",
    )
    .bind(order_id)
    .bind(client_view)
    .fetch_all(&state.db)
    .await?;
    Ok(rows)
}
