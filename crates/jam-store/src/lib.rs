//! # jam-store
//!
//! Service layer for Jamboree state management.
//!
//! Everything durable lives in the remote table store reached through
//! `jam-gateway`; this crate owns the logic above it:
//! - the schema-negotiating writer that discovers an acceptable insert
//!   payload shape against a drifting column set
//! - the jam lifecycle operations (create, advance, draft deletion)
//! - the sync reconciler pushing submissions to the external library
//! - the audit log with its write-time retention ceiling
//! - the TTL/capacity profile cache
//!
//! All repository methods are implemented as `impl JamService` blocks in
//! `repos/`.

pub mod cache;
pub mod content;
pub mod error;
mod helpers;
pub mod repos;
pub mod service;
mod writer;

#[cfg(test)]
mod test_support;

pub use cache::ProfileCache;
pub use content::{ContentHost, NoopContentHost};
pub use error::StoreError;
pub use repos::admin::AdminSet;
pub use repos::jam::{CreateJamRequest, JamSettingsUpdate};
pub use repos::project::NewProject;
pub use repos::sync::classify_sync_error;
pub use service::JamService;
