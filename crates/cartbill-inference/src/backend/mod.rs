//! Inference backend implementations.

pub mod gemini;
pub mod openai;

use async_trait::async_trait;

use crate::{ImagePayload, Result};

/// Trait for vision-language inference providers.
///
/// One call sends one image with one instruction prompt and returns the
/// model's raw text reply. Implementations make a single attempt; retries
/// are left to callers.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Run inference on an image with the given instruction prompt.
    async fn infer(&self, image: &ImagePayload, prompt: &str) -> Result<String>;

    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Model identifier used in logs.
    fn model(&self) -> &str;
}
