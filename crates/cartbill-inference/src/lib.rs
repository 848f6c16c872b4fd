//! Vision-language inference abstraction layer for cartbill.
//!
//! This crate provides a unified interface for sending an image plus an
//! instruction prompt to a multimodal model and getting its text reply back:
//! - `gemini` talks to the Google Generative Language `generateContent` API
//! - `openai` talks to any OpenAI-compatible `/chat/completions` endpoint
//!   (Ollama, vLLM, hosted APIs)

mod backend;
mod error;
mod payload;

pub use backend::InferenceProvider;
pub use backend::gemini::{GeminiBackend, GeminiSettings};
pub use backend::openai::{OpenAiBackend, OpenAiSettings};
pub use error::InferenceError;
pub use payload::ImagePayload;

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
