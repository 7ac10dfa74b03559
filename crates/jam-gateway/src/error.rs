//! Gateway error types.

use thiserror::Error;

use crate::diagnostic::Diagnostic;

/// Errors that can occur when talking to the table store.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store returned a non-success status code; the diagnostic is the
    /// classified error body.
    #[error("API error ({status}): {diagnostic}")]
    Api { status: u16, diagnostic: Diagnostic },

    /// The configured role cannot reach the schema — a deployment
    /// configuration problem, distinguished from per-request failures.
    #[error("schema permission denied: {0}")]
    SchemaPermission(String),

    /// Failed to decode a response body.
    #[error("parse error: {0}")]
    Parse(String),
}

impl GatewayError {
    /// The classified diagnostic, when this is a remote API error.
    #[must_use]
    pub const fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Api { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}
