//! Payment confirmation paths: synchronous cash-on-delivery confirmation
//! and the asynchronous provider webhook.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Actor, LifecycleEvent, Order, OrderStatus, PaymentMethod, PaymentStatus, UserRole};
use crate::error::{AppError, Result};
use crate::services::{notify, orders};
use crate::AppState;

/// Provider status strings treated as a successful payment; anything else
/// is a failure.
const SUCCESS_STATES: [&str; 4] = ["ACCEPTED", "SUCCESS", "SUCCEEDED", "COMPLETED"];

#[derive(Debug, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Payment confirmed; the order moved to `PAYMENT_CONFIRMED`.
    Confirmed(Uuid),
    /// Duplicate delivery; the order was already confirmed. No-op.
    AlreadyConfirmed(Uuid),
    /// Provider reported failure; payment status recorded, order untouched.
    Failed(Uuid),
}

/// Confirm a cash-on-delivery order immediately after creation.
///
/// Customers may only confirm their own orders; admins may confirm any.
pub async fn confirm_cash_on_delivery(
    state: &AppState,
    order_id: Uuid,
    actor: &Actor,
) -> Result<Order> {
    let mut tx = state.db.begin().await?;

    let order = orders::lock_order(&mut tx, order_id).await?;
    if order.user_id != actor.id && actor.role != UserRole::Admin {
        return Err(AppError::Forbidden("not your order"));
    }
    if order.payment_method != PaymentMethod::CashOnDelivery {
        return Err(AppError::Precondition(
            "order is not cash-on-delivery".into(),
        ));
    }
    if !OrderStatus::can_transition(order.status, OrderStatus::PaymentConfirmed) {
        return Err(AppError::InvalidTransition {
            from: order.status.as_str(),
            to: OrderStatus::PaymentConfirmed.as_str(),
        });
    }

    let payment_id = format!("COD-{}", order.id);
    let updated = orders::apply_transition(
        &mut tx,
        &order,
        OrderStatus::PaymentConfirmed,
        Some(actor.id),
        Some("cash on delivery: order confirmed"),
    )
    .await?;
    // Settlement happens at the door, so payment_status stays PENDING.
    sqlx::query("UPDATE orders SET payment_id = $2 WHERE id = $1")
        .bind(order.id)
        .bind(&payment_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    notify::fan_out_to_role(
        state,
        UserRole::Admin,
        "New cash-on-delivery order",
        &format!(
            "Order {} confirmed for cash on delivery. Next step: purchase from supplier.",
            updated.order_number
        ),
    )
    .await;
    notify::publish(
        state,
        &LifecycleEvent::OrderStatusChanged {
            order_id: updated.id,
            order_number: updated.order_number.clone(),
            from: order.status,
            to: OrderStatus::PaymentConfirmed,
        },
    )
    .await;

    Ok(updated)
}

/// Apply a provider webhook identified by transaction id.
///
/// Idempotent against duplicate delivery: an order whose payment already
/// succeeded returns [`WebhookOutcome::AlreadyConfirmed`] without a second
/// history row.
pub async fn apply_webhook(
    state: &AppState,
    transaction_id: &str,
    provider_status: &str,
) -> Result<WebhookOutcome> {
    let mut tx = state.db.begin().await?;

    let order = lock_order_by_payment_id(&mut tx, transaction_id).await?;
    if order.payment_status == PaymentStatus::Succeeded {
        return Ok(WebhookOutcome::AlreadyConfirmed(order.id));
    }

    let normalized = provider_status.to_uppercase();
    if !SUCCESS_STATES.contains(&normalized.as_str()) {
        sqlx::query("UPDATE orders SET payment_status = 'FAILED', updated_at = NOW() WHERE id = $1")
            .bind(order.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::warn!(
            order = %order.order_number,
            provider_status = %normalized,
            "payment failed"
        );
        return Ok(WebhookOutcome::Failed(order.id));
    }

    if !OrderStatus::can_transition(order.status, OrderStatus::PaymentConfirmed) {
        return Err(AppError::InvalidTransition {
            from: order.status.as_str(),
            to: OrderStatus::PaymentConfirmed.as_str(),
        });
    }

    // Webhook-triggered: no human actor on the history row.
    let updated = orders::apply_transition(
        &mut tx,
        &order,
        OrderStatus::PaymentConfirmed,
        None,
        Some(&format!("payment webhook: {normalized}")),
    )
    .await?;
    sqlx::query("UPDATE orders SET payment_status = 'SUCCEEDED' WHERE id = $1")
        .bind(order.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    notify::fan_out_to_role(
        state,
        UserRole::Admin,
        "New paid order",
        &format!(
            "Order {} is paid. Next step: purchase from supplier.",
            updated.order_number
        ),
    )
    .await;
    notify::publish(
        state,
        &LifecycleEvent::OrderStatusChanged {
            order_id: updated.id,
            order_number: updated.order_number.clone(),
            from: order.status,
            to: OrderStatus::PaymentConfirmed,
        },
    )
    .await;

    Ok(WebhookOutcome::Confirmed(updated.id))
}

/// Attach a provider transaction id to an order about to be paid online.
pub async fn register_payment_intent(
    db: &PgPool,
    order_id: Uuid,
    transaction_id: &str,
) -> Result<()> {
    let result = sqlx::query("UPDATE orders SET payment_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .bind(transaction_id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("order {order_id}")));
    }
    Ok(())
}

async fn lock_order_by_payment_id(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    transaction_id: &str,
) -> Result<Order> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE payment_id = $1 FOR UPDATE")
        .bind(transaction_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order for transaction {transaction_id}")))
}
