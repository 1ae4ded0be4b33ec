//! Shipment consolidation: batching orders onto the international leg and
//! cascading shipment events into bulk order transitions.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{Actor, LifecycleEvent, OrderStatus, Shipment, ShipmentStatus, UserRole};
use crate::error::{AppError, Result};
use crate::services::{notify, orders};
use crate::AppState;

pub struct NewShipmentInput {
    pub order_ids: Vec<Uuid>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OrderRef {
    id: Uuid,
    order_number: String,
    status: OrderStatus,
}

/// Consolidate a batch of orders into one shipment.
///
/// All candidates must currently be `ORDERED_FROM_SUPPLIER`; the check is
/// all-or-nothing and nothing persists on failure. Creation and dispatch
/// are fused: the shipment is born in `SENT_TO_HUB` and every member order
/// moves to `IN_TRANSIT_TO_ABIDJAN` in the same transaction.
pub async fn create_shipment(
    state: &AppState,
    input: NewShipmentInput,
    actor: &Actor,
) -> Result<Shipment> {
    if input.order_ids.is_empty() {
        return Err(AppError::Validation("order_ids must not be empty".into()));
    }

    // Duplicates in the request collapse to one membership; sorting also
    // gives a deterministic lock order across concurrent batch operations.
    let mut order_ids = input.order_ids;
    order_ids.sort_unstable();
    order_ids.dedup();

    let mut tx = state.db.begin().await?;

    let candidates = sqlx::query_as::<_, OrderRef>(
        "SELECT id, order_number, status FROM orders
         WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(&order_ids)
    .fetch_all(&mut *tx)
    .await?;

    if candidates.len() != order_ids.len() {
        let missing = order_ids.len() - candidates.len();
        return Err(AppError::NotFound(format!(
            "{missing} of {} orders",
            order_ids.len()
        )));
    }

    let not_ready: Vec<&str> = candidates
        .iter()
        .filter(|o| o.status != OrderStatus::OrderedFromSupplier)
        .map(|o| o.order_number.as_str())
        .collect();
    if !not_ready.is_empty() {
        return Err(AppError::Precondition(format!(
            "orders not awaiting shipment: {}",
            not_ready.join(", ")
        )));
    }

    let shipment = sqlx::query_as::<_, Shipment>(
        "INSERT INTO shipments (id, status, carrier, tracking_number, notes, created_by)
         VALUES ($1, 'SENT_TO_HUB', $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&input.carrier)
    .bind(&input.tracking_number)
    .bind(&input.notes)
    .bind(actor.id)
    .fetch_one(&mut *tx)
    .await?;

    for order in &candidates {
        sqlx::query("INSERT INTO shipment_orders (id, shipment_id, order_id) VALUES ($1, $2, $3)")
            .bind(Uuid::now_v7())
            .bind(shipment.id)
            .bind(order.id)
            .execute(&mut *tx)
            .await?;
    }

    bulk_transition(
        &mut tx,
        &candidates,
        OrderStatus::OrderedFromSupplier,
        OrderStatus::InTransitToAbidjan,
        actor.id,
        None,
    )
    .await?;

    tx.commit().await?;

    let order_numbers = join_numbers(&candidates);
    tracing::info!(
        shipment = %shipment.id,
        orders = %order_numbers,
        "shipment dispatched to hub"
    );
    notify::fan_out_to_role(
        state,
        UserRole::FulfillmentManager,
        "Shipment en route to Abidjan",
        &format!("A shipment is in transit with orders: {order_numbers}"),
    )
    .await;
    notify::publish(
        state,
        &LifecycleEvent::ShipmentDispatched {
            shipment_id: shipment.id,
            order_count: candidates.len(),
        },
    )
    .await;

    Ok(shipment)
}

/// Move a shipment one step along its chain.
///
/// Reception at the hub additionally stamps the receiving actor and bulk-
/// transitions every member order still in transit to `IN_PREPARATION`;
/// orders already moved on by other means are skipped.
pub async fn transition_shipment(
    state: &AppState,
    shipment_id: Uuid,
    target: ShipmentStatus,
    notes: Option<&str>,
    actor: &Actor,
) -> Result<Shipment> {
    let mut tx = state.db.begin().await?;

    let shipment =
        sqlx::query_as::<_, Shipment>("SELECT * FROM shipments WHERE id = $1 FOR UPDATE")
            .bind(shipment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("shipment {shipment_id}")))?;

    if !ShipmentStatus::can_transition(shipment.status, target) {
        return Err(AppError::InvalidTransition {
            from: shipment.status.as_str(),
            to: target.as_str(),
        });
    }

    let received = target == ShipmentStatus::ReceivedAtHub;
    let updated = sqlx::query_as::<_, Shipment>(
        "UPDATE shipments
         SET status = $3, notes = COALESCE($4, notes),
             received_by = CASE WHEN $5 THEN $6 ELSE received_by END,
             updated_at = NOW()
         WHERE id = $1 AND status = $2 RETURNING *",
    )
    .bind(shipment.id)
    .bind(shipment.status)
    .bind(target)
    .bind(notes)
    .bind(received)
    .bind(actor.id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::InvalidTransition {
        from: shipment.status.as_str(),
        to: target.as_str(),
    })?;

    let mut arrived = Vec::new();
    if received {
        let members = sqlx::query_as::<_, OrderRef>(
            "SELECT o.id, o.order_number, o.status
             FROM orders o JOIN shipment_orders so ON so.order_id = o.id
             WHERE so.shipment_id = $1 ORDER BY o.id FOR UPDATE OF o",
        )
        .bind(shipment.id)
        .fetch_all(&mut *tx)
        .await?;

        arrived = members
            .into_iter()
            .filter(|o| o.status == OrderStatus::InTransitToAbidjan)
            .collect();

        if !arrived.is_empty() {
            let note = format!("shipment {} received in Abidjan, order in preparation", shipment.id);
            bulk_transition(
                &mut tx,
                &arrived,
                OrderStatus::InTransitToAbidjan,
                OrderStatus::InPreparation,
                actor.id,
                Some(&note),
            )
            .await?;
        }
    }

    tx.commit().await?;

    if received {
        let order_numbers = join_numbers(&arrived);
        tracing::info!(
            shipment = %updated.id,
            orders = %order_numbers,
            "shipment received at hub"
        );
        notify::fan_out_to_role(
            state,
            UserRole::Admin,
            "Shipment received in Abidjan",
            &format!(
                "Shipment {} was received. Orders now in preparation: {order_numbers}",
                updated.id
            ),
        )
        .await;
        notify::publish(
            state,
            &LifecycleEvent::ShipmentReceived {
                shipment_id: updated.id,
                order_count: arrived.len(),
            },
        )
        .await;
    }

    Ok(updated)
}

/// Move every order in `batch` from `from` to `to` with one history row
/// each. The guarded update must touch exactly the batch; anything less
/// means a concurrent writer got in despite the locks, and the whole
/// transaction is abandoned.
async fn bulk_transition(
    tx: &mut Transaction<'_, Postgres>,
    batch: &[OrderRef],
    from: OrderStatus,
    to: OrderStatus,
    actor_id: Uuid,
    note: Option<&str>,
) -> Result<()> {
    let ids: Vec<Uuid> = batch.iter().map(|o| o.id).collect();
    let result = sqlx::query(
        "UPDATE orders SET status = $3, updated_at = NOW()
         WHERE id = ANY($1) AND status = $2",
    )
    .bind(&ids)
    .bind(from)
    .bind(to)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() != batch.len() as u64 {
        return Err(AppError::Precondition(
            "order status changed concurrently".into(),
        ));
    }

    for order in batch {
        orders::insert_history(
            tx,
            order.id,
            Some(from),
            to,
            Some(actor_id),
            note,
            to.is_client_visible(),
        )
        .await?;
    }
    Ok(())
}

fn join_numbers(batch: &[OrderRef]) -> String {
    batch
        .iter()
        .map(|o| o.order_number.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
