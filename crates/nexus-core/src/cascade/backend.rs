use async_trait::async_trait;
use thiserror::Error;

/// Raw failure from a model call. The message is what the classifier sees.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
    pub status: Option<u16>,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), status: None }
    }

    /// HTTP failure; the status code leads the message so keyword matching sees it.
    pub fn http(status: u16, body: &str) -> Self {
        Self { message: format!("{} {}", status, body.trim()), status: Some(status) }
    }
}

/// A model API: one prompt in, generated text out.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn generate_content(&self, model: &str, prompt: &str) -> Result<String, BackendError>;
}
