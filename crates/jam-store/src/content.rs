//! External content host seam.
//!
//! Page creation and deletion against the external content system are side
//! effects outside this crate's correctness boundary: creation is a
//! precondition of `create_jam`, deletion during draft removal is
//! best-effort cleanup.

use async_trait::async_trait;

use jam_core::ids;

/// Side-effect boundary for the external content host.
#[async_trait]
pub trait ContentHost: Send + Sync {
    /// Create a page for a jam, returning its external id.
    async fn create_page(
        &self,
        title: &str,
        parent_page_id: Option<&str>,
    ) -> anyhow::Result<String>;

    /// Delete a jam's page.
    async fn delete_page(&self, page_id: &str) -> anyhow::Result<()>;
}

/// Content host that fabricates page ids and discards deletions.
///
/// Useful for deployments without a content integration and for tests.
#[derive(Debug, Default)]
pub struct NoopContentHost;

#[async_trait]
impl ContentHost for NoopContentHost {
    async fn create_page(
        &self,
        _title: &str,
        _parent_page_id: Option<&str>,
    ) -> anyhow::Result<String> {
        Ok(ids::new_id("page"))
    }

    async fn delete_page(&self, _page_id: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
