//! Order and shipment state machines.
//!
//! The transition tables below are the single source of truth for status
//! legality; nothing outside `services` writes a status column, and the
//! services always consult these tables first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a customer order, ordered as the happy path.
///
/// The supply-chain leg (`OrderedFromSupplier` through `ReceivedInAbidjan`)
/// is internal: customers only ever see payment confirmation and the
/// domestic delivery leg.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    PaymentConfirmed,
    OrderedFromSupplier,
    InTransitToAbidjan,
    ReceivedInAbidjan,
    InPreparation,
    InDelivery,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Legal `(from, to)` pairs. Anything absent is illegal, including
    /// self-transitions and exits from the two terminal states.
    pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (from, to),
            (PendingPayment, PaymentConfirmed)
                | (PendingPayment, Cancelled)
                | (PaymentConfirmed, OrderedFromSupplier)
                | (PaymentConfirmed, Cancelled)
                | (OrderedFromSupplier, InTransitToAbidjan)
                | (InTransitToAbidjan, ReceivedInAbidjan)
                | (ReceivedInAbidjan, InPreparation)
                | (InPreparation, InDelivery)
                | (InPreparation, Cancelled)
                | (InDelivery, Delivered)
                | (InDelivery, Cancelled)
                | (Delivered, Refunded)
        )
    }

    /// Whether a status appears in the customer-facing timeline.
    ///
    /// Procurement statuses and the terminal exits are staff-only.
    pub fn is_client_visible(self) -> bool {
        use OrderStatus::*;
        matches!(self, PaymentConfirmed | InPreparation | InDelivery | Delivered)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refunded)
    }

    pub fn as_str(self) -> &'static str {
        use OrderStatus::*;
        match self {
            PendingPayment => "PENDING_PAYMENT",
            PaymentConfirmed => "PAYMENT_CONFIRMED",
            OrderedFromSupplier => "ORDERED_FROM_SUPPLIER",
            InTransitToAbidjan => "IN_TRANSIT_TO_ABIDJAN",
            ReceivedInAbidjan => "RECEIVED_IN_ABIDJAN",
            InPreparation => "IN_PREPARATION",
            InDelivery => "IN_DELIVERY",
            Delivered => "DELIVERED",
            Cancelled => "CANCELLED",
            Refunded => "REFUNDED",
        }
    }

    pub const ALL: [OrderStatus; 10] = [
        OrderStatus::PendingPayment,
        OrderStatus::PaymentConfirmed,
        OrderStatus::OrderedFromSupplier,
        OrderStatus::InTransitToAbidjan,
        OrderStatus::ReceivedInAbidjan,
        OrderStatus::InPreparation,
        OrderStatus::InDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refunded,
    ];
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a consolidated shipment: a strict forward chain, no
/// skipping and no backtracking. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Draft,
    SentToHub,
    ReceivedAtHub,
    Closed,
}

impl ShipmentStatus {
    pub fn can_transition(from: ShipmentStatus, to: ShipmentStatus) -> bool {
        use ShipmentStatus::*;
        matches!(
            (from, to),
            (Draft, SentToHub) | (SentToHub, ReceivedAtHub) | (ReceivedAtHub, Closed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Draft => "DRAFT",
            ShipmentStatus::SentToHub => "SENT_TO_HUB",
            ShipmentStatus::ReceivedAtHub => "RECEIVED_AT_HUB",
            ShipmentStatus::Closed => "CLOSED",
        }
    }

    pub const ALL: [ShipmentStatus; 4] = [
        ShipmentStatus::Draft,
        ShipmentStatus::SentToHub,
        ShipmentStatus::ReceivedAtHub,
        ShipmentStatus::Closed,
    ];
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    fn legal_targets(from: OrderStatus) -> Vec<OrderStatus> {
        match from {
            PendingPayment => vec![PaymentConfirmed, Cancelled],
            PaymentConfirmed => vec![OrderedFromSupplier, Cancelled],
            OrderedFromSupplier => vec![InTransitToAbidjan],
            InTransitToAbidjan => vec![ReceivedInAbidjan],
            ReceivedInAbidjan => vec![InPreparation],
            InPreparation => vec![InDelivery, Cancelled],
            InDelivery => vec![Delivered, Cancelled],
            Delivered => vec![Refunded],
            Cancelled | Refunded => vec![],
        }
    }

    #[test]
    fn transition_table_is_exact() {
        for from in OrderStatus::ALL {
            let legal = legal_targets(from);
            for to in OrderStatus::ALL {
                assert_eq!(
                    OrderStatus::can_transition(from, to),
                    legal.contains(&to),
                    "unexpected result for {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn self_transitions_are_illegal() {
        for s in OrderStatus::ALL {
            assert!(!OrderStatus::can_transition(s, s));
        }
    }

    #[test]
    fn terminal_states_have_no_exit() {
        for to in OrderStatus::ALL {
            assert!(!OrderStatus::can_transition(Cancelled, to));
            assert!(!OrderStatus::can_transition(Refunded, to));
        }
    }

    #[test]
    fn client_visibility_allowlist() {
        let visible = [PaymentConfirmed, InPreparation, InDelivery, Delivered];
        for s in OrderStatus::ALL {
            assert_eq!(s.is_client_visible(), visible.contains(&s), "{s}");
        }
    }

    #[test]
    fn shipment_chain_is_strictly_forward() {
        use ShipmentStatus as S;
        for from in S::ALL {
            for to in S::ALL {
                let legal = matches!(
                    (from, to),
                    (S::Draft, S::SentToHub)
                        | (S::SentToHub, S::ReceivedAtHub)
                        | (S::ReceivedAtHub, S::Closed)
                );
                assert_eq!(S::can_transition(from, to), legal, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn status_wire_names_round_trip() {
        for s in OrderStatus::ALL {
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.as_str()));
            let back: OrderStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, s);
        }
    }
}
