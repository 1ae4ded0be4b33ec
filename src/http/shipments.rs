//! Back-office shipment endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Actor, Order, Shipment, ShipmentStatus, UserRole};
use crate::error::{AppError, Result};
use crate::http::{require_admin, require_staff};
use crate::services::shipments as shipment_service;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateShipmentRequest {
    #[validate(length(min = 1))]
    pub order_ids: Vec<Uuid>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<Shipment>)> {
    require_admin(&actor)?;
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let shipment = shipment_service::create_shipment(
        &state,
        shipment_service::NewShipmentInput {
            order_ids: req.order_ids,
            carrier: req.carrier,
            tracking_number: req.tracking_number,
            notes: req.notes,
        },
        &actor,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

pub async fn list(State(state): State<AppState>, actor: Actor) -> Result<Json<Vec<Shipment>>> {
    require_staff(&actor)?;
    let shipments =
        sqlx::query_as::<_, Shipment>("SELECT * FROM shipments ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(shipments))
}

#[derive(Debug, Serialize)]
pub struct ShipmentDetail {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub orders: Vec<Order>,
}

pub async fn get_one(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<ShipmentDetail>> {
    require_staff(&actor)?;
    let shipment = sqlx::query_as::<_, Shipment>("SELECT * FROM shipments WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("shipment {id}")))?;
    let orders = sqlx::query_as::<_, Order>(
        "SELECT o.* FROM orders o
         JOIN shipment_orders so ON so.order_id = o.id
         WHERE so.shipment_id = $1 ORDER BY o.created_at",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(ShipmentDetail { shipment, orders }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateShipmentRequest {
    pub status: ShipmentStatus,
    pub notes: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateShipmentRequest>,
) -> Result<Json<Shipment>> {
    require_staff(&actor)?;
    // Reception and closing happen at the hub; dispatch is an admin act.
    if actor.role == UserRole::FulfillmentManager
        && !matches!(req.status, ShipmentStatus::ReceivedAtHub | ShipmentStatus::Closed)
    {
        return Err(AppError::Forbidden(
            "status not allowed for fulfillment manager",
        ));
    }
    let shipment = shipment_service::transition_shipment(
        &state,
        id,
        req.status,
        req.notes.as_deref(),
        &actor,
    )
    .await?;
    Ok(Json(shipment))
}
