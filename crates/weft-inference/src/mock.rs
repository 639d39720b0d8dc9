//! Mock generation backend for deterministic testing.
//!
//! Scripted responses are returned in order, then the default response.
//! Transport failures and service errors can be injected to exercise the
//! orchestrator's retry and degrade paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use weft_core::{Error, GenerationBackend, Result};

/// Mock inference backend.
pub struct MockBackend {
    responses: Mutex<Vec<String>>,
    default_response: String,
    transport_failures: AtomicUsize,
    service_error: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockBackend {
    /// Backend that answers every call with an empty array.
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            default_response: "[]".to_string(),
            transport_failures: AtomicUsize::new(0),
            service_error: false,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue one scripted response (consumed in FIFO order).
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().expect("mock lock").push(response.into());
        self
    }

    /// Fail the first `n` calls with a retryable transport error.
    pub fn with_transport_failures(self, n: usize) -> Self {
        self.transport_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every call with a non-retryable service error.
    pub fn with_service_error(mut self) -> Self {
        self.service_error = true;
        self
    }

    /// Number of generate calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("mock lock").clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().expect("mock lock").push(prompt.to_string());

        if self.service_error {
            return Err(Error::Inference("mock service error".to_string()));
        }

        let remaining = self.transport_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transport_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::Request("mock transport failure".to_string()));
        }

        let mut responses = self.responses.lock().expect("mock lock");
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.service_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_then_default() {
        let backend = MockBackend::new().with_response("first");
        assert_eq!(backend.generate("p").await.unwrap(), "first");
        assert_eq!(backend.generate("p").await.unwrap(), "[]");
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_transport_failures_consumed() {
        let backend = MockBackend::new().with_transport_failures(1);
        assert!(backend.generate("p").await.is_err());
        assert!(backend.generate("p").await.is_ok());
    }

    #[tokio::test]
    async fn test_prompt_log() {
        let backend = MockBackend::new();
        backend.generate("hello").await.unwrap();
        assert_eq!(backend.prompts(), vec!["hello".to_string()]);
    }
}
