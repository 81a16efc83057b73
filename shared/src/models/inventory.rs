//! Inventory event ledger entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger entry types. Quantity is stored non-negative; the sign of the
/// stock contribution is inferred from the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryEventType {
    /// Delivery into the distributor's stock.
    In,
    /// Opening balance entry.
    Opening,
    /// Stock returned by an outlet.
    Return,
    /// Shipment out to an outlet.
    Sent,
    /// Sold to an end customer.
    Sold,
}

impl InventoryEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryEventType::In => "IN",
            InventoryEventType::Opening => "OPENING",
            InventoryEventType::Return => "RETURN",
            InventoryEventType::Sent => "SENT",
            InventoryEventType::Sold => "SOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IN" => Some(InventoryEventType::In),
            "OPENING" => Some(InventoryEventType::Opening),
            "RETURN" => Some(InventoryEventType::Return),
            "SENT" => Some(InventoryEventType::Sent),
            "SOLD" => Some(InventoryEventType::Sold),
            _ => None,
        }
    }

    /// Whether this type adds to stock (IN, OPENING, RETURN) or removes
    /// from it (SENT, SOLD).
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            InventoryEventType::In | InventoryEventType::Opening | InventoryEventType::Return
        )
    }
}

/// One immutable ledger entry. Never updated or deleted; corrections are
/// made by appending a compensating event.
///
/// `event_type` is kept as the raw stored string so the ledger fold can
/// flag unknown types instead of failing at the decode boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEvent {
    pub id: Uuid,
    pub distributor_id: Uuid,
    pub sku_id: Uuid,
    pub event_type: String,
    pub quantity: i64,
    pub event_date: DateTime<Utc>,
}

impl InventoryEvent {
    pub fn kind(&self) -> Option<InventoryEventType> {
        InventoryEventType::parse(&self.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_round_trips() {
        for t in [
            InventoryEventType::In,
            InventoryEventType::Opening,
            InventoryEventType::Return,
            InventoryEventType::Sent,
            InventoryEventType::Sold,
        ] {
            assert_eq!(InventoryEventType::parse(t.as_str()), Some(t));
        }
        assert_eq!(InventoryEventType::parse("DAMAGED"), None);
    }

    #[test]
    fn inbound_classification() {
        assert!(InventoryEventType::In.is_inbound());
        assert!(InventoryEventType::Opening.is_inbound());
        assert!(InventoryEventType::Return.is_inbound());
        assert!(!InventoryEventType::Sent.is_inbound());
        assert!(!InventoryEventType::Sold.is_inbound());
    }
}
