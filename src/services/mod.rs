//! Transactional services
pub mod notify;
pub mod orders;
pub mod payments;
pub mod shipments;
