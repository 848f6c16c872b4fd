//! One "generate bill" run: images in, bill and summary out.

use std::path::Path;

use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};

use crate::bill::{BillDocument, BillFormatter};
use crate::extract::ItemExtractor;
use crate::models::config::CartBillConfig;
use crate::models::item::ExtractionBatch;
use crate::summary::{SummaryTable, summarize};
use crate::{CartBillError, Result};

/// An uploaded screenshot: display name plus encoded bytes.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read an image file, naming it after its file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, std::fs::read(path)?))
    }
}

/// What happened to one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ImageStatus {
    /// The model returned at least one item.
    Extracted,
    /// Extraction produced nothing (model failure or empty cart).
    NoItems,
    /// The bytes could not be decoded as an image.
    DecodeFailed(String),
}

/// Per-image outcome, in upload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReport {
    pub name: String,
    pub items: usize,
    pub status: ImageStatus,
}

/// Everything one successful run produces.
#[derive(Debug, Clone, Serialize)]
pub struct BillOutcome {
    pub batch: ExtractionBatch,
    pub bill: BillDocument,
    pub summary: SummaryTable,
    pub reports: Vec<ImageReport>,
}

/// Orchestrates extraction, formatting and tabulation for a run.
pub struct BillSession {
    extractor: ItemExtractor,
    formatter: BillFormatter,
}

impl BillSession {
    pub fn new(extractor: ItemExtractor, formatter: BillFormatter) -> Self {
        Self {
            extractor,
            formatter,
        }
    }

    /// Build a session with the configured backend.
    pub fn from_config(config: &CartBillConfig, api_key: Option<&str>) -> Result<Self> {
        let provider = config.inference.build_provider(api_key)?;
        Ok(Self::new(
            ItemExtractor::new(provider),
            BillFormatter::from_config(&config.bill),
        ))
    }

    /// Process all images in order and produce the bill.
    pub async fn run(&self, images: &[ImageInput], store: &str) -> Result<BillOutcome> {
        self.run_with_progress(images, store, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_image(index, name)` before each image.
    ///
    /// Images are handled one at a time. An image that fails to decode is
    /// skipped with a warning. If no image yields any item the run fails with
    /// [`CartBillError::NoItemsExtracted`].
    pub async fn run_with_progress(
        &self,
        images: &[ImageInput],
        store: &str,
        mut on_image: impl FnMut(usize, &str),
    ) -> Result<BillOutcome> {
        let mut batch = ExtractionBatch::new();
        let mut reports = Vec::with_capacity(images.len());

        for (index, input) in images.iter().enumerate() {
            on_image(index, &input.name);

            let decoded = match image::load_from_memory(&input.bytes) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(index, name = %input.name, error = %e, "Could not decode image, skipping");
                    reports.push(ImageReport {
                        name: input.name.clone(),
                        items: 0,
                        status: ImageStatus::DecodeFailed(e.to_string()),
                    });
                    continue;
                }
            };

            let span = info_span!("image", index, name = %input.name);
            let items = self.extractor.extract(&decoded).instrument(span).await;
            info!(index, name = %input.name, items = items.len(), "Extracted items");

            reports.push(ImageReport {
                name: input.name.clone(),
                items: items.len(),
                status: if items.is_empty() {
                    ImageStatus::NoItems
                } else {
                    ImageStatus::Extracted
                },
            });
            batch.extend(items);
        }

        if batch.is_empty() {
            warn!(images = images.len(), "No items extracted from any image");
            return Err(CartBillError::NoItemsExtracted);
        }

        let bill = self.formatter.format(batch.items(), store);
        let summary = summarize(batch.items());

        info!(
            items = batch.len(),
            billed = bill.item_count,
            subtotal = %bill.subtotal,
            total = %bill.rounded_total,
            "Bill generated"
        );

        Ok(BillOutcome {
            batch,
            bill,
            summary,
            reports,
        })
    }
}
