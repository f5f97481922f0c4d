//! Event lines broadcast to observers after successful mutations.
//!
//! Observers match on these texts, so their wording is part of the external interface.

use crate::model::ProductId;

/// Remaining stock below this value triggers a low-stock alert after a sale.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

pub fn product_added(name: &str) -> String {
    format!("System: New product added - {name}")
}

pub fn product_updated(name: &str) -> String {
    format!("System: Product updated - {name}")
}

pub fn product_deleted(id: ProductId) -> String {
    format!("System: Product deleted ID {id}")
}

pub fn low_stock(name: &str, remaining: i64) -> String {
    format!("ALERT: Low stock for {name} (Qty: {remaining})")
}

pub fn sale_completed(quantity: i64, id: ProductId) -> String {
    format!("Sale: {quantity} units of item {id} sold.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_texts() {
        assert_eq!(product_added("Widget"), "System: New product added - Widget");
        assert_eq!(product_updated("Widget"), "System: Product updated - Widget");
        assert_eq!(product_deleted(ProductId(4)), "System: Product deleted ID 4");
        assert_eq!(low_stock("Widget", 1), "ALERT: Low stock for Widget (Qty: 1)");
        assert_eq!(sale_completed(2, ProductId(4)), "Sale: 2 units of item 4 sold.");
    }
}
