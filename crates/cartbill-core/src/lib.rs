//! Core library for turning shopping-cart screenshots into provisional bills.
//!
//! This crate provides:
//! - Cart item extraction through a vision-language [`InferenceProvider`]
//! - Bill text formatting with a ceiling-rounded provisional total
//! - Summary tables and their CSV/XLSX exports
//! - A session orchestrator tying the steps together for one run

pub mod bill;
pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod session;
pub mod summary;

pub use bill::{BillDocument, BillFormatter};
pub use error::{CartBillError, ExtractionError, Result};
pub use extract::{EXTRACTION_PROMPT, ItemExtractor};
pub use models::config::{Backend, CartBillConfig};
pub use models::item::{ExtractionBatch, LineItem};
pub use models::store::Store;
pub use session::{BillOutcome, BillSession, ImageInput, ImageReport, ImageStatus};
pub use summary::{SummaryRow, SummaryTable, summarize};

/// Re-export inference types.
pub use cartbill_inference::{ImagePayload, InferenceError, InferenceProvider};
