//! Store error taxonomy.
//!
//! Local recovery happens only inside the writer (candidate negotiation) and
//! the reconciler's per-item loop; every other failure propagates through
//! these variants with enough context for the caller to decide between
//! automatic retry and human escalation.

use jam_core::errors::CoreError;
use jam_gateway::GatewayError;
use thiserror::Error;

/// Errors from the Jamboree service layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Actor is not authorized for the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Input rejected before any write occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The jam's lifecycle state does not permit this operation.
    #[error("Read-only: {0}")]
    ReadOnly(String),

    /// The `results → completed` transition requires a complete sync.
    #[error("Sync incomplete: {0}")]
    SyncIncomplete(String),

    /// The current lifecycle state has no forward successor.
    #[error("Terminal state: {0}")]
    Terminal(String),

    /// The writer ran out of payload candidates.
    #[error("schema negotiation exhausted after {attempts} attempts: {last}")]
    SchemaNegotiationExhausted {
        attempts: usize,
        #[source]
        last: GatewayError,
    },

    /// A reconciliation run died mid-flight (not a per-item failure); the
    /// message is persisted to the sync state and guidance is attached here.
    #[error("sync run failed: {message} — {guidance}")]
    SyncRun { message: String, guidance: String },

    /// External content host failure that is a precondition (page creation).
    #[error("content host error: {0}")]
    Content(String),

    /// A stored row could not be decoded into its entity.
    #[error("decode error: {0}")]
    Decode(String),

    /// Underlying gateway failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::InvalidTransition { .. } => Self::Terminal(err.to_string()),
            CoreError::Other(e) => Self::Decode(e.to_string()),
        }
    }
}
