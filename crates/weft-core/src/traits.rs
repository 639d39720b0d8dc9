//! Trait seams for pluggable backends.

use async_trait::async_trait;

use crate::error::Result;

/// Text generation backend (the external AI scoring service).
///
/// Implementations must be cheap to share behind a reference; the pipeline
/// holds one instance for the whole run.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt. Errors are transport- or
    /// service-level; the caller decides whether to retry.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;

    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool>;
}
