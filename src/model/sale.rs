use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt::Display;

use super::ProductId;

/// Name reported for a sale whose product name was never captured and whose product is gone.
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown";

/// Identifier of a sale record, increasing with every recorded sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(pub i64);

impl Display for SaleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable record of one completed sale.
///
/// The product name and total are captured at sale time, so the record stays correct after
/// the product is renamed, repriced or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: SaleId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub total_price: f64,
    pub sale_date: DateTime<Utc>,
}

/// Result of a sale attempt.
///
/// Callers that only need the yes/no answer use [`SaleOutcome::is_sold`]; the other variants
/// tell a missing product apart from short stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaleOutcome {
    /// Stock was debited and `record` appended. `remaining` is the stock left right after the
    /// debit, read in the same consistency unit.
    Sold { record: SaleRecord, remaining: i64 },
    InsufficientStock { available: i64 },
    ProductMissing,
}

impl SaleOutcome {
    pub fn is_sold(&self) -> bool {
        matches!(self, SaleOutcome::Sold { .. })
    }
}

/// Picks the display name of a stored sale: captured name, then current product name, then
/// [`UNKNOWN_PRODUCT_NAME`].
pub fn resolve_sale_name(captured: Option<String>, current: Option<String>) -> String {
    captured
        .or(current)
        .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_fallback_chain() {
        assert_eq!(resolve_sale_name(Some("Old".into()), Some("New".into())), "Old");
        assert_eq!(resolve_sale_name(None, Some("New".into())), "New");
        assert_eq!(resolve_sale_name(None, None), UNKNOWN_PRODUCT_NAME);
    }

    #[test]
    fn test_outcome_wire_shape() {
        let json = serde_json::to_value(SaleOutcome::InsufficientStock { available: 1 }).unwrap();
        assert_eq!(json["status"], "insufficient_stock");
        assert_eq!(json["available"], 1);
        assert!(!SaleOutcome::ProductMissing.is_sold());
    }
}
