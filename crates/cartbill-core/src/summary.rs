//! Row-per-item summary table for display and export.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::item::LineItem;

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    /// `"{emoji} {title}\n{details}"`.
    pub item: String,
    /// Unit price as stored on the item (0 when it could not be read).
    pub unit_price: Decimal,
    /// Quantity as stored on the item.
    pub quantity: u32,
}

/// Summary of every extracted item, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Column headers for the given currency label.
    pub fn headers(currency: &str) -> [String; 3] {
        [
            "Item".to_string(),
            format!("Unit Price ({currency})"),
            "Qty".to_string(),
        ]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build the summary table. Unlike the bill, no item is dropped.
pub fn summarize(items: &[LineItem]) -> SummaryTable {
    let rows = items
        .iter()
        .map(|item| SummaryRow {
            item: format!(
                "{} {}\n{}",
                item.emoji.as_deref().unwrap_or_default(),
                item.title.as_deref().unwrap_or_default(),
                item.details
            ),
            unit_price: item.price,
            quantity: item.quantity,
        })
        .collect();

    SummaryTable { rows }
}
