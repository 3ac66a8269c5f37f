//! Provider error types.
//!
//! These error types represent failures when fetching questions or quiz
//! descriptors from a provider. Defined in `prephub-core` so the session
//! runner can surface them without knowing which provider produced them.

use thiserror::Error;

/// Errors that can occur when interacting with a question provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The server could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The API rejected the credentials (missing or expired token).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The response body could not be understood.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl ProviderError {
    /// Returns `true` if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::Timeout(_) => true,
            ProviderError::Api { status, .. } => *status >= 500,
            ProviderError::Unauthorized(_)
            | ProviderError::NotFound(_)
            | ProviderError::MalformedPayload(_) => false,
        }
    }
}
