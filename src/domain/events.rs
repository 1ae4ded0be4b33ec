//! Lifecycle events published to NATS after a successful commit.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::status::OrderStatus;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    OrderCreated {
        order_id: Uuid,
        order_number: String,
    },
    OrderStatusChanged {
        order_id: Uuid,
        order_number: String,
        from: OrderStatus,
        to: OrderStatus,
    },
    ShipmentDispatched {
        shipment_id: Uuid,
        order_count: usize,
    },
    ShipmentReceived {
        shipment_id: Uuid,
        order_count: usize,
    },
}

impl LifecycleEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            LifecycleEvent::OrderCreated { .. } => "orders.created",
            LifecycleEvent::OrderStatusChanged { .. } => "orders.status_changed",
            LifecycleEvent::ShipmentDispatched { .. } => "shipments.dispatched",
            LifecycleEvent::ShipmentReceived { .. } => "shipments.received",
        }
    }
}
