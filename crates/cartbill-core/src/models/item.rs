//! Cart line items and the per-run batch that collects them.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single extracted cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Short product name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Single emoji matching the product.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,

    /// Option summary (colour, size, capacity, ...). May be empty.
    #[serde(default)]
    pub details: String,

    /// Quantity, at least 1.
    pub quantity: u32,

    /// Unit price, never negative.
    pub price: Decimal,

    /// False when quantity or price was present but not numeric.
    /// Such items stay out of the bill but are still tabulated.
    pub billable: bool,
}

/// Outcome of coercing one numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coerced<T> {
    Absent,
    Valid(T),
    Invalid,
}

impl<T> Coerced<T> {
    fn value_or(self, default: T) -> T {
        match self {
            Coerced::Valid(v) => v,
            Coerced::Absent | Coerced::Invalid => default,
        }
    }

    fn is_invalid(&self) -> bool {
        matches!(self, Coerced::Invalid)
    }
}

impl LineItem {
    /// Create a billable item from already-typed values.
    pub fn new(
        title: impl Into<String>,
        emoji: impl Into<String>,
        details: impl Into<String>,
        quantity: u32,
        price: Decimal,
    ) -> Self {
        Self {
            title: Some(title.into()),
            emoji: Some(emoji.into()),
            details: details.into(),
            quantity: quantity.max(1),
            price: price.max(Decimal::ZERO),
            billable: true,
        }
    }

    /// Build an item from one object of the model's JSON reply.
    ///
    /// Missing quantity becomes 1 and missing price becomes 0. Values that are
    /// present but not coercible fall back to the same defaults and mark the
    /// item as not billable.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let quantity = coerce_quantity(object.get("quantity"));
        let price = coerce_price(object.get("price"));
        let billable = !quantity.is_invalid() && !price.is_invalid();

        Self {
            title: text_field(object.get("title")),
            emoji: text_field(object.get("emoji")),
            details: text_field(object.get("details")).unwrap_or_default(),
            quantity: quantity.value_or(1),
            price: price.value_or(Decimal::ZERO),
            billable,
        }
    }

    /// `price × quantity`, or `None` when the product does not fit a `Decimal`.
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_quantity(value: Option<&Value>) -> Coerced<u32> {
    let whole = match value {
        None | Some(Value::Null) => return Coerced::Absent,
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };

    match whole.and_then(|q| u32::try_from(q).ok()) {
        Some(q) if q >= 1 => Coerced::Valid(q),
        _ => Coerced::Invalid,
    }
}

fn coerce_price(value: Option<&Value>) -> Coerced<Decimal> {
    let parsed = match value {
        None | Some(Value::Null) => return Coerced::Absent,
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        Some(Value::String(s)) => parse_decimal(s.trim()),
        Some(_) => None,
    };

    match parsed {
        Some(p) if p >= Decimal::ZERO => Coerced::Valid(p),
        _ => Coerced::Invalid,
    }
}

/// Parse plain (`25.50`) or scientific (`2.55e1`) notation.
fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Line items gathered across all images of one run, in upload order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtractionBatch {
    items: Vec<LineItem>,
}

impl ExtractionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the items extracted from one image.
    pub fn extend(&mut self, items: impl IntoIterator<Item = LineItem>) {
        self.items.extend(items);
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }
}

impl From<Vec<LineItem>> for ExtractionBatch {
    fn from(items: Vec<LineItem>) -> Self {
        Self { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> LineItem {
        LineItem::from_json(value.as_object().unwrap())
    }

    #[test]
    fn test_full_item() {
        let parsed = item(json!({
            "title": "Phone Case",
            "emoji": "📱",
            "details": "Black, iPhone 13",
            "quantity": 1,
            "price": 25.50
        }));
        assert_eq!(parsed, LineItem::new("Phone Case", "📱", "Black, iPhone 13", 1, Decimal::new(255, 1)));
    }

    #[test]
    fn test_missing_fields_default() {
        let parsed = item(json!({}));
        assert_eq!(parsed.title, None);
        assert_eq!(parsed.emoji, None);
        assert_eq!(parsed.details, "");
        assert_eq!(parsed.quantity, 1);
        assert_eq!(parsed.price, Decimal::ZERO);
        assert!(parsed.billable);
    }

    #[test]
    fn test_null_is_absent() {
        let parsed = item(json!({"quantity": null, "price": null}));
        assert_eq!(parsed.quantity, 1);
        assert!(parsed.billable);
    }

    #[test]
    fn test_numeric_strings_coerce() {
        let parsed = item(json!({"quantity": " 3 ", "price": "19.99"}));
        assert_eq!(parsed.quantity, 3);
        assert_eq!(parsed.price, Decimal::new(1999, 2));
        assert!(parsed.billable);
    }

    #[test]
    fn test_float_quantity_truncates() {
        assert_eq!(item(json!({"quantity": 2.7})).quantity, 2);
    }

    #[test]
    fn test_bad_price_not_billable() {
        let parsed = item(json!({"title": "Mug", "quantity": 2, "price": "abc"}));
        assert_eq!(parsed.price, Decimal::ZERO);
        assert_eq!(parsed.quantity, 2);
        assert!(!parsed.billable);
    }

    #[test]
    fn test_bad_quantity_not_billable() {
        for bad in [json!("two"), json!("2.5"), json!(0), json!(-1), json!(true), json!([1])] {
            let parsed = item(json!({"quantity": bad, "price": 5}));
            assert_eq!(parsed.quantity, 1);
            assert!(!parsed.billable);
        }
    }

    #[test]
    fn test_negative_price_not_billable() {
        let parsed = item(json!({"price": -4.5}));
        assert_eq!(parsed.price, Decimal::ZERO);
        assert!(!parsed.billable);
    }

    #[test]
    fn test_scientific_price() {
        assert_eq!(item(json!({"price": "1.5e2"})).price, Decimal::from(150));
    }

    #[test]
    fn test_line_total() {
        let shoes = LineItem::new("Shoes", "👟", "Size 42", 2, Decimal::new(15000, 2));
        assert_eq!(shoes.line_total(), Some(Decimal::from(300)));
    }

    #[test]
    fn test_line_total_overflow() {
        let parsed = item(json!({"title": "Yacht", "quantity": 100, "price": 1e27}));
        assert!(parsed.billable);
        assert_eq!(parsed.line_total(), None);
    }

    #[test]
    fn test_batch_preserves_order() {
        let mut batch = ExtractionBatch::new();
        batch.extend(vec![LineItem::new("A", "", "", 1, Decimal::ONE)]);
        batch.extend(vec![LineItem::new("B", "", "", 1, Decimal::ONE)]);
        let titles: Vec<_> = batch.items().iter().map(|i| i.title.as_deref()).collect();
        assert_eq!(titles, vec![Some("A"), Some("B")]);
        assert_eq!(batch.len(), 2);
    }
}
