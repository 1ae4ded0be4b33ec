//! Payment collaborator endpoints: the provider webhook and the
//! synchronous cash-on-delivery confirmation.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{Actor, Order};
use crate::error::{AppError, Result};
use crate::services::payments;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentWebhookBody {
    #[serde(alias = "transactionId")]
    pub transaction_id: Option<String>,
    pub status: Option<String>,
}

/// Unauthenticated by design: the provider calls this endpoint directly.
/// Duplicate deliveries are absorbed by the idempotence check downstream.
pub async fn payment_webhook(
    State(state): State<AppState>,
    Json(body): Json<PaymentWebhookBody>,
) -> Result<Json<serde_json::Value>> {
    let transaction_id = body
        .transaction_id
        .ok_or_else(|| AppError::Validation("transaction_id required".into()))?;
    let provider_status = body.status.unwrap_or_default();

    let outcome = payments::apply_webhook(&state, &transaction_id, &provider_status).await?;
    let response = match outcome {
        payments::WebhookOutcome::Confirmed(order_id) => {
            serde_json::json!({ "processed": true, "order_id": order_id })
        }
        payments::WebhookOutcome::AlreadyConfirmed(order_id) => {
            serde_json::json!({ "processed": true, "idempotent": true, "order_id": order_id })
        }
        payments::WebhookOutcome::Failed(order_id) => {
            serde_json::json!({ "processed": true, "payment_failed": true, "order_id": order_id })
        }
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmCodRequest {
    pub order_id: Uuid,
}

pub async fn confirm_cod(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<ConfirmCodRequest>,
) -> Result<Json<Order>> {
    let order = payments::confirm_cash_on_delivery(&state, req.order_id, &actor).await?;
    Ok(Json(order))
}
