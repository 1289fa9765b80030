use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// One oracle submission: an instruction plus invocation settings.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    /// System-level framing for the oracle.
    pub system: String,
    /// The full task instruction, including the grounding context.
    pub instruction: String,
    pub model: String,
    pub temperature: f32,
}

/// Oracle errors
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("http error: {0}")]
    Http(String),
    #[error("response error: {0}")]
    Response(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// The external reasoning oracle: submit instruction text, receive
/// response text. Timeouts, auth failures and transport errors all
/// surface as `OracleError`; the oracle is never retried here.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError>;
}

#[async_trait]
impl Oracle for Arc<dyn Oracle> {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        (**self).complete(request).await
    }
}

/// Canned-response oracle for tests.
pub struct MockOracle {
    pub response: String,
}

#[async_trait]
impl Oracle for MockOracle {
    async fn complete(&self, _request: OracleRequest) -> Result<String, OracleError> {
        Ok(self.response.clone())
    }
}
