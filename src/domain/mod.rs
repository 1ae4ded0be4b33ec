//! Domain module
pub mod events;
pub mod order;
pub mod shipment;
pub mod status;
pub mod user;

pub use events::LifecycleEvent;
pub use order::{Order, OrderItem, OrderStatusHistory, PaymentMethod, PaymentStatus};
pub use shipment::{Shipment, ShipmentOrder};
pub use status::{OrderStatus, ShipmentStatus};
pub use user::{Actor, Notification, User, UserRole};
