//! Error types for the inference layer.

use thiserror::Error;

/// Errors that can occur while calling a vision-language model.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// No API key was configured for a backend that needs one.
    #[error("missing API key for {0} backend")]
    MissingApiKey(&'static str),

    /// The HTTP request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The service answered but the reply held no text.
    #[error("empty response from model")]
    EmptyResponse,

    /// The response envelope did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
