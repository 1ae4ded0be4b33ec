//! Staff notification inbox.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::domain::{Actor, Notification};
use crate::error::Result;
use crate::services::notify;
use crate::AppState;

pub async fn list(State(state): State<AppState>, actor: Actor) -> Result<Json<Vec<Notification>>> {
    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC LIMIT 100",
    )
    .bind(actor.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    notify::mark_read(&state.db, actor.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
