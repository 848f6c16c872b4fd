//! Error types for the cartbill-core library.

use thiserror::Error;

/// Main error type for the cartbill library.
#[derive(Error, Debug)]
pub enum CartBillError {
    /// Every image in the run contributed zero items.
    #[error("No items could be extracted. Please check the image quality or API key.")]
    NoItemsExtracted,

    /// Item extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Inference error from the inference layer.
    #[error("inference error: {0}")]
    Inference(#[from] cartbill_inference::InferenceError),

    /// Image decoding or encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet export error.
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning one model reply into line items.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The model call failed.
    #[error("inference failed: {0}")]
    Inference(#[from] cartbill_inference::InferenceError),

    /// The image could not be re-encoded for upload.
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    /// The cleaned reply was not valid JSON.
    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The reply was JSON but not an array of items.
    #[error("expected a JSON array of items, got {0}")]
    NotAnArray(&'static str),
}

/// Result type for the cartbill library.
pub type Result<T> = std::result::Result<T, CartBillError>;
