//! Staff/customer roles, the per-request actor, and notification rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    FulfillmentManager,
    Customer,
}

impl UserRole {
    pub fn from_header(value: &str) -> Option<UserRole> {
        match value {
            "ADMIN" => Some(UserRole::Admin),
            "FULFILLMENT_MANAGER" => Some(UserRole::FulfillmentManager),
            "CUSTOMER" => Some(UserRole::Customer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::FulfillmentManager => "FULFILLMENT_MANAGER",
            UserRole::Customer => "CUSTOMER",
        }
    }

    pub fn is_staff(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::FulfillmentManager)
    }
}

/// The already-authenticated caller of a core operation. Supplied
/// explicitly by the session collaborator; the core never reads ambient
/// request state.
#[derive(Clone, Copy, Debug)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// Staff inbox entry, created by post-commit fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
