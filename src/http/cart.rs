//! Minimal cart surface; order creation consumes these rows.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Actor;
use crate::error::Result;
use crate::AppState;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub sale_price: i64,
}

pub async fn get_cart(State(state): State<AppState>, actor: Actor) -> Result<Json<Vec<CartLine>>> {
    let lines = sqlx::query_as::<_, CartLine>(
        "SELECT ci.id, ci.product_id, p.name AS product_name, ci.quantity, p.sale_price
         FROM cart_items ci JOIN products p ON p.id = ci.product_id
         WHERE ci.user_id = $1 ORDER BY ci.created_at",
    )
    .bind(actor.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(lines))
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

pub async fn add_item(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<AddToCartRequest>,
) -> Result<StatusCode> {
    sqlx::query(
        "INSERT INTO cart_items (id, user_id, product_id, quantity)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (user_id, product_id)
         DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity",
    )
    .bind(Uuid::now_v7())
    .bind(actor.id)
    .bind(req.product_id)
    .bind(req.quantity.max(1))
    .execute(&state.db)
    .await?;
    Ok(StatusCode::CREATED)
}

pub async fn clear(State(state): State<AppState>, actor: Actor) -> Result<StatusCode> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(actor.id)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
