//! HTTP layer: actor extraction, role guards, routing.
//!
//! Handlers stay thin; everything that writes goes through `services`.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Actor, UserRole};
use crate::error::{AppError, Result};
use crate::AppState;

pub mod cart;
pub mod notifications;
pub mod orders;
pub mod shipments;
pub mod webhooks;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/cart", get(cart::get_cart).post(cart::add_item).delete(cart::clear))
        .route("/api/v1/orders", get(orders::list_own).post(orders::create))
        .route("/api/v1/orders/:id", get(orders::get_one))
        .route("/api/v1/orders/:id/status", put(orders::update_status))
        .route("/api/v1/admin/orders", get(orders::list_all))
        .route("/api/v1/payments/cod/confirm", post(webhooks::confirm_cod))
        .route("/api/v1/webhooks/payment", post(webhooks::payment_webhook))
        .route(
            "/api/v1/shipments",
            get(shipments::list).post(shipments::create),
        )
        .route("/api/v1/shipments/:id", get(shipments::get_one))
        .route("/api/v1/shipments/:id/status", put(shipments::update_status))
        .route("/api/v1/notifications", get(notifications::list))
        .route("/api/v1/notifications/:id/read", put(notifications::mark_read))
        .with_state(state)
}

/// The session collaborator is external to this service; it forwards the
/// authenticated identity as headers, which we trust as-is.
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let id = header("x-actor-id")
            .and_then(|v| Uuid::parse_str(&v).ok())
            .ok_or(AppError::Unauthorized)?;
        let role = header("x-actor-role")
            .and_then(|v| UserRole::from_header(&v))
            .ok_or(AppError::Unauthorized)?;
        Ok(Actor { id, role })
    }
}

pub fn require_admin(actor: &Actor) -> Result<()> {
    if actor.role == UserRole::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin role required"))
    }
}

pub fn require_staff(actor: &Actor) -> Result<()> {
    if actor.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden("staff role required"))
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
}

impl ListParams {
    pub fn limits(&self) -> (u32, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).min(100);
        // Widen before multiplying; page comes straight from the query string.
        let offset = i64::from(page - 1) * i64::from(per_page);
        (page, i64::from(per_page), offset)
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_caps() {
        let params = ListParams { page: None, per_page: Some(500), status: None };
        assert_eq!(params.limits(), (1, 100, 0));
        let params = ListParams { page: Some(3), per_page: None, status: None };
        assert_eq!(params.limits(), (3, 20, 40));
    }

    #[test]
    fn pagination_offset_survives_huge_page_numbers() {
        let params = ListParams { page: Some(u32::MAX), per_page: Some(100), status: None };
        let (page, limit, offset) = params.limits();
        assert_eq!(page, u32::MAX);
        assert_eq!(limit, 100);
        assert_eq!(offset, (i64::from(u32::MAX) - 1) * 100);
    }
}
