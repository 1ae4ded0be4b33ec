//! Consolidated shipments and their order membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::status::ShipmentStatus;

/// A batch of orders travelling together on the international leg.
/// `received_by` is stamped only when the shipment reaches the hub.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Shipment {
    pub id: Uuid,
    pub status: ShipmentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub received_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Join row; one per order contained in a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShipmentOrder {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub order_id: Uuid,
    pub created_at: DateTime<Utc>,
}
