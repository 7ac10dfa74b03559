//! Table store connection configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayConfig {
    /// Base URL of the table store REST endpoint.
    #[serde(default)]
    pub url: String,

    /// Service key used for both the `apikey` header and bearer auth.
    #[serde(default)]
    pub service_key: String,
}

impl GatewayConfig {
    /// Whether both required fields are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.service_key.is_empty()
    }
}
