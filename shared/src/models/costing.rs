//! Cost resolution strategy for SKU unit costs

use serde::{Deserialize, Serialize};

/// How the vendor-cost component of a SKU's unit cost is resolved.
///
/// Two strategies coexist: deriving from the product's per-kg rate and the
/// SKU weight, or taking the pre-calculated per-unit figure stored on the
/// SKU. Callers pick one explicitly; the engine never guesses from which
/// fields happen to be populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStrategy {
    /// `vendor_cost_per_kg / 1000 * weight_grams`
    PerKgFromWeight,
    /// `calculated_vendor_cost` as stored on the SKU
    PrecalculatedPerUnit,
}
