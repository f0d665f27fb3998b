pub mod dialogue;
pub mod inference;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::payload::Payload;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

/// Pattern-matching dialogue engine queried before the inference API.
#[async_trait]
pub trait DialogueBackend: Send + Sync {
    async fn reply(&self, user_id: &str, message: &str) -> Result<String, BackendError>;
}

/// Hosted language-model inference API.
///
/// `Ok(None)` means the call succeeded but carried no generated text.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(
        &self,
        chatbot: &str,
        payload: &Payload,
        authorization: &str
    ) -> Result<Option<String>, BackendError>;
}

async fn error_for_status(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(BackendError::Status { status: status.as_u16(), body })
}
