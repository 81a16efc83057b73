//! Per-(supermarket, SKU) pricing and commission rules

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a commission value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionType {
    /// Percentage of line revenue.
    Percentage,
    /// Flat amount per unit sold.
    Flat,
}

impl CommissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionType::Percentage => "PERCENTAGE",
            CommissionType::Flat => "FLAT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PERCENTAGE" => Some(CommissionType::Percentage),
            "FLAT" => Some(CommissionType::Flat),
            _ => None,
        }
    }
}

/// The commission-relevant part of a pricing rule, as the financial
/// aggregator consumes it. At most one rule exists per (supermarket, SKU)
/// pair; absence means zero commission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommissionRule {
    pub kind: CommissionType,
    pub value: Decimal,
}
