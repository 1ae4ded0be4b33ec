//! Order endpoints: storefront creation/listing plus the staff status PUT.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Actor, Order, OrderItem, OrderStatus, OrderStatusHistory, PaymentMethod, UserRole};
use crate::error::{AppError, Result};
use crate::http::{require_staff, ListParams, PaginatedResponse};
use crate::services::orders as order_service;
use crate::AppState;

/// Statuses a fulfillment manager may target; everything else is admin-only.
const FULFILLMENT_TARGETS: [OrderStatus; 3] = [
    OrderStatus::InPreparation,
    OrderStatus::InDelivery,
    OrderStatus::Delivered,
];

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1))]
    pub delivery_city: String,
    pub delivery_commune: Option<String>,
    #[validate(length(min = 1))]
    pub delivery_address: String,
    #[validate(length(min = 6))]
    pub delivery_phone: String,
    pub payment_method: PaymentMethod,
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let order = order_service::create_order(
        &state,
        &actor,
        order_service::NewOrderInput {
            delivery_city: req.delivery_city,
            delivery_commune: req.delivery_commune,
            delivery_address: req.delivery_address,
            delivery_phone: req.delivery_phone,
            payment_method: req.payment_method,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_own(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Order>>> {
    let (page, limit, offset) = params.limits();
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders
         WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(actor.id)
    .bind(&params.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;
    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)",
    )
    .bind(actor.id)
    .bind(&params.status)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(PaginatedResponse {
        data: orders,
        total: total.0,
        page,
    }))
}

pub async fn list_all(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<ListParams>,
) -> Result<Json<PaginatedResponse<Order>>> {
    require_staff(&actor)?;
    let (page, limit, offset) = params.limits();
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE ($1::text IS NULL OR status = $1)
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(&params.status)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;
    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
            .bind(&params.status)
            .fetch_one(&state.db)
            .await?;
    Ok(Json(PaginatedResponse {
        data: orders,
        total: total.0,
        page,
    }))
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub history: Vec<OrderStatusHistory>,
}

pub async fn get_one(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let staff = actor.role.is_staff();
    if !staff && order.user_id != actor.id {
        return Err(AppError::NotFound(format!("order {id}")));
    }

    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(id)
        .fetch_all(&state.db)
        .await?;
    // Customers only see the curated timeline; staff sees everything.
    let history = order_service::history(&state, id, !staff).await?;

    Ok(Json(OrderDetail {
        order,
        items,
        history,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    pub note: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    require_staff(&actor)?;
    if actor.role == UserRole::FulfillmentManager && !FULFILLMENT_TARGETS.contains(&req.status) {
        return Err(AppError::Forbidden(
            "status not allowed for fulfillment manager",
        ));
    }
    let order =
        order_service::request_transition(&state, id, req.status, &actor, req.note.as_deref())
            .await?;
    Ok(Json(order))
}
