//! Cart item extraction through a vision-language model.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use serde_json::Value;
use tracing::{debug, warn};

use cartbill_inference::{ImagePayload, InferenceProvider};

use crate::error::ExtractionError;
use crate::models::item::LineItem;

/// Instruction sent with every screenshot.
pub const EXTRACTION_PROMPT: &str = r#"You are an expert data extractor. Your task is to extract shopping cart items from the provided screenshot.

For each item, extract the following fields:
1.  **Short Title**: A concise name for the item (e.g., "Accordion File Bag", "Phone Case").
2.  **Emoji**: A single relevant emoji matching the item (e.g., 🗂️, 📱, 👟).
3.  **Details**: A comprehensive yet clean summary of all visible options (Color, Size, Model, Capacity, Dimensions). Avoid generic words like "Details:". Example: "Color: Blue, Size: A4" or "60 Colors, Dual-Tip".
4.  **Quantity**: The quantity of the item. If not visible, default to 1.
5.  **Price**: The price of the item as a number (remove currency symbols like QAR, SAR, AED, $, etc.).

Return the result strictly as a JSON array of objects with the keys "title", "emoji", "details", "quantity" and "price". Do not include markdown formatting (```json ... ```).
Example format:
[
    {"title": "Phone Case", "emoji": "📱", "details": "Black, iPhone 13", "quantity": 1, "price": 25.50},
    {"title": "Running Shoes", "emoji": "👟", "details": "Size 42, White", "quantity": 2, "price": 150.00}
]"#;

/// Number of reply characters echoed to the debug log.
const REPLY_PREVIEW_CHARS: usize = 100;

/// Extracts line items from cart screenshots.
pub struct ItemExtractor {
    provider: Box<dyn InferenceProvider>,
    prompt: String,
}

impl ItemExtractor {
    /// Create an extractor using the standard prompt.
    pub fn new(provider: Box<dyn InferenceProvider>) -> Self {
        Self {
            provider,
            prompt: EXTRACTION_PROMPT.to_string(),
        }
    }

    /// Replace the instruction prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Extract items from one image.
    ///
    /// Never fails: any inference or parse error is logged and yields an
    /// empty list, so a bad image simply contributes nothing.
    pub async fn extract(&self, image: &DynamicImage) -> Vec<LineItem> {
        match self.try_extract(image).await {
            Ok(items) => items,
            Err(e) => {
                warn!(
                    backend = self.provider.name(),
                    error = %e,
                    "Item extraction failed, skipping image"
                );
                Vec::new()
            }
        }
    }

    /// Extract items from one image, surfacing the failure cause.
    pub async fn try_extract(&self, image: &DynamicImage) -> Result<Vec<LineItem>, ExtractionError> {
        let payload = encode_png(image)?;

        debug!(
            backend = self.provider.name(),
            model = self.provider.model(),
            "Sending request to model"
        );
        let reply = self.provider.infer(&payload, &self.prompt).await?;
        debug!(
            preview = %reply.chars().take(REPLY_PREVIEW_CHARS).collect::<String>(),
            "Received response from model"
        );

        parse_items(&reply)
    }
}

fn encode_png(image: &DynamicImage) -> Result<ImagePayload, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(ImagePayload::png(buf.into_inner()))
}

/// Remove markdown code fences the model adds despite being told not to.
pub fn strip_code_fences(reply: &str) -> String {
    reply.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a model reply into line items.
pub fn parse_items(reply: &str) -> Result<Vec<LineItem>, ExtractionError> {
    let cleaned = strip_code_fences(reply);
    let value: Value = serde_json::from_str(&cleaned)?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(_) => return Err(ExtractionError::NotAnArray("an object")),
        Value::String(_) => return Err(ExtractionError::NotAnArray("a string")),
        Value::Number(_) => return Err(ExtractionError::NotAnArray("a number")),
        Value::Bool(_) => return Err(ExtractionError::NotAnArray("a boolean")),
        Value::Null => return Err(ExtractionError::NotAnArray("null")),
    };

    let items = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry.as_object() {
            Some(object) => Some(LineItem::from_json(object)),
            None => {
                warn!(index, "Skipping reply entry that is not an object");
                None
            }
        })
        .collect();

    Ok(items)
}
