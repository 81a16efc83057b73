//! Party-related enums shared between storage and reporting

use serde::{Deserialize, Serialize};

/// Outlet classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutletType {
    Chain,
    Batch,
}

impl OutletType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutletType::Chain => "Chain",
            OutletType::Batch => "Batch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Chain" => Some(OutletType::Chain),
            "Batch" => Some(OutletType::Batch),
            _ => None,
        }
    }
}
