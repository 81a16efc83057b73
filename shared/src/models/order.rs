//! Orders and their line items

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sales channel an order came through. Supermarket orders reference a
/// supermarket row; every other channel carries a free-form customer name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SalesChannel {
    Supermarket,
    Whatsapp,
    Instagram,
    Website,
    Other,
}

impl SalesChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesChannel::Supermarket => "Supermarket",
            SalesChannel::Whatsapp => "Whatsapp",
            SalesChannel::Instagram => "Instagram",
            SalesChannel::Website => "Website",
            SalesChannel::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Supermarket" => Some(SalesChannel::Supermarket),
            "Whatsapp" => Some(SalesChannel::Whatsapp),
            "Instagram" => Some(SalesChannel::Instagram),
            "Website" => Some(SalesChannel::Website),
            "Other" => Some(SalesChannel::Other),
            _ => None,
        }
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Paid,
    Pending,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PAID" => Some(PaymentStatus::Paid),
            "PENDING" => Some(PaymentStatus::Pending),
            "CANCELLED" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }
}

/// An order header. Owns its items (cascade delete at the storage layer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub distributor_id: Uuid,
    /// Present only when `sales_channel` is Supermarket.
    pub supermarket_id: Option<Uuid>,
    pub sales_channel: SalesChannel,
    /// Present for direct-to-customer channels.
    pub customer_name: Option<String>,
    /// Human-readable per-distributor daily sequence, `DD-MM-NN`.
    pub order_ref: String,
    pub total_amount: Decimal,
    pub amount_received: Decimal,
    pub payment_status: PaymentStatus,
    pub order_date: DateTime<Utc>,
    pub comments: Option<String>,
}

/// One order line. `price_per_unit` is snapshotted at creation and never
/// recomputed from the current SKU price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: Uuid,
    pub sku_id: Uuid,
    pub quantity: i64,
    pub price_per_unit: Decimal,
    pub total_price: Decimal,
}

impl OrderItem {
    /// Snapshotted line revenue: quantity times the locked-in unit price.
    pub fn line_revenue(&self) -> Decimal {
        self.price_per_unit * Decimal::from(self.quantity)
    }
}
