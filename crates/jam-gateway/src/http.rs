//! Shared HTTP response helpers for the table client.
//!
//! Centralizes the non-2xx → [`GatewayError`] mapping (diagnostic
//! classification, schema-permission detection) so the client methods stay
//! focused on request construction and row decoding.

use crate::diagnostic::Diagnostic;
use crate::error::GatewayError;

/// Check an HTTP response for error conditions.
///
/// Returns the response unchanged on success. A non-success status reads the
/// body, classifies it, and maps "permission denied for schema" to the
/// distinguished [`GatewayError::SchemaPermission`] variant.
pub async fn check_response(
    resp: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(status, body = %body, "table store returned an error");
    match Diagnostic::from_body(&body) {
        Diagnostic::PermissionDenied { message } => Err(GatewayError::SchemaPermission(message)),
        diagnostic => Err(GatewayError::Api { status, diagnostic }),
    }
}
