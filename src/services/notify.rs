//! Post-commit side effects: staff notification fan-out and NATS events.
//!
//! Everything here runs after the primary transaction has committed and is
//! best-effort: failures are logged and swallowed, never surfaced to the
//! caller of the state change.

use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{LifecycleEvent, UserRole};
use crate::AppState;

/// Insert one notification row per user holding `role`.
pub async fn fan_out_to_role(state: &AppState, role: UserRole, title: &str, message: &str) {
    match insert_for_role(&state.db, role, title, message).await {
        Ok(count) => {
            tracing::debug!(role = role.as_str(), count, title, "notified staff");
        }
        Err(err) => {
            tracing::warn!(%err, role = role.as_str(), title, "notification fan-out failed");
        }
    }
}

async fn insert_for_role(
    db: &PgPool,
    role: UserRole,
    title: &str,
    message: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        "INSERT INTO notifications (id, user_id, title, message)
         SELECT gen_random_uuid(), id, $2, $3 FROM users WHERE role = $1",
    )
    .bind(role)
    .bind(title)
    .bind(message)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

/// Publish a lifecycle event when a NATS client is configured.
pub async fn publish(state: &AppState, event: &LifecycleEvent) {
    let Some(nats) = &state.nats else { return };
    let payload = match serde_json::to_vec(event) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(%err, subject = event.subject(), "event serialization failed");
            return;
        }
    };
    if let Err(err) = nats.publish(event.subject(), payload.into()).await {
        tracing::warn!(%err, subject = event.subject(), "event publish failed");
    }
}

/// Mark one of the actor's notifications as read.
pub async fn mark_read(db: &PgPool, user_id: Uuid, notification_id: Uuid) -> crate::error::Result<()> {
    let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
        .bind(notification_id)
        .bind(user_id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(crate::error::AppError::NotFound(format!(
            "notification {notification_id}"
        )));
    }
    Ok(())
}
