//! Abidjan Commerce
//!
//! Storefront and back-office service for a cross-border dropshipping
//! business: goods are purchased from overseas suppliers, consolidated into
//! shipments to Abidjan, then delivered locally.
//!
//! The heart of the crate is the order lifecycle (ten statuses with a fixed
//! transition table and an append-only audit trail) and the shipment
//! consolidation logic that moves batches of orders through the
//! international leg. Everything mutates through one-transaction service
//! functions in [`services`]; notifications and NATS events are dispatched
//! best-effort after commit.

pub mod domain;
pub mod error;
pub mod http;
pub mod services;

/// Shared handler/service state.
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
    /// Flat local delivery fee in XOF, added to every order total.
    pub shipping_fee: i64,
}

impl AppState {
    pub fn new(db: sqlx::PgPool) -> Self {
        Self {
            db,
            nats: None,
            shipping_fee: 2500,
        }
    }
}
