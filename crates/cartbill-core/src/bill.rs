//! Provisional bill text formatting.

use std::fmt::Write as _;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::config::BillConfig;
use crate::models::item::LineItem;

const DEFAULT_EMOJI: &str = "▫️";
const DEFAULT_TITLE: &str = "Item";
const SEPARATOR: &str = "──────────────";

/// Formatted bill and the figures behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillDocument {
    /// Bill text ready to paste into a chat.
    pub text: String,
    /// Unrounded sum of `price × quantity` over billable items.
    pub subtotal: Decimal,
    /// `ceil(subtotal)`, as printed in the bill.
    pub rounded_total: Decimal,
    /// Number of item blocks in the text.
    pub item_count: usize,
}

/// Renders line items into the provisional bill template.
#[derive(Debug, Clone)]
pub struct BillFormatter {
    brand: String,
    currency: String,
}

impl BillFormatter {
    /// Create a formatter with the given brand and currency label.
    pub fn new(brand: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            currency: currency.into(),
        }
    }

    /// Create a formatter from the bill configuration.
    pub fn from_config(config: &BillConfig) -> Self {
        Self::new(&config.brand, &config.currency)
    }

    /// Format the bill for `store`.
    ///
    /// Items whose quantity or price could not be read are left out of both
    /// the text and the subtotal.
    pub fn format(&self, items: &[LineItem], store: &str) -> BillDocument {
        let mut text = String::new();
        let mut subtotal = Decimal::ZERO;
        let mut item_count = 0;

        let _ = write!(
            text,
            "🧾 {} – Provisional Bill - {store}\n📦 Order in Process\n\n",
            self.brand
        );

        for item in items {
            if !item.billable {
                debug!(title = ?item.title, "Leaving non-numeric item out of the bill");
                continue;
            }

            let Some(next) = item.line_total().and_then(|t| subtotal.checked_add(t)) else {
                warn!(
                    title = ?item.title,
                    price = %item.price,
                    quantity = item.quantity,
                    "Item total out of range, leaving it out of the bill"
                );
                continue;
            };
            subtotal = next;
            item_count += 1;

            let _ = write!(
                text,
                "{} {}\n▫️ {}\n▫️ Qty {}\n💰 {:.2} {}\n\n",
                item.emoji.as_deref().unwrap_or(DEFAULT_EMOJI),
                item.title.as_deref().unwrap_or(DEFAULT_TITLE),
                item.details,
                item.quantity,
                display_price(item.price),
                self.currency
            );
        }

        let rounded_total = round_total(subtotal);

        text.push_str(SEPARATOR);
        text.push('\n');
        text.push_str("🚚 Delivery Fee: (select via Google form)\n");
        let _ = write!(
            text,
            "✅ Provisional Total: {rounded_total:.0} {} + Delivery fee\n\n",
            self.currency
        );
        let _ = writeln!(
            text,
            "Thank you for shopping with {} 💙 Packed with care – delivered with love 🥰",
            self.brand
        );

        BillDocument {
            text,
            subtotal,
            rounded_total,
            item_count,
        }
    }
}

impl Default for BillFormatter {
    fn default() -> Self {
        Self::from_config(&BillConfig::default())
    }
}

/// Round a unit price to cents, halves away from zero.
fn display_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a subtotal up to the next whole currency unit.
pub fn round_total(subtotal: Decimal) -> Decimal {
    subtotal.ceil().normalize()
}
