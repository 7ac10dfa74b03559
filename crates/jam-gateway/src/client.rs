//! HTTP implementation of the table protocol.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::filter::{Filter, SelectOptions, build_url};
use crate::http::check_response;
use crate::{Row, TableBackend};

/// HTTP client for a PostgREST-style table store.
///
/// Authenticates with a service key sent both as `apikey` and bearer token.
/// All write methods ask for `return=representation` so callers get the
/// stored rows back.
pub struct TableClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl TableClient {
    /// Create a new client against `base_url` (e.g. `https://db.example.com/rest/v1`).
    ///
    /// # Panics
    ///
    /// Panics if the underlying `reqwest::Client` fails to build.
    #[must_use]
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent("jamboree/0.1")
                .timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("reqwest client should build"),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn decode_rows(resp: reqwest::Response) -> Result<Vec<Row>, GatewayError> {
        resp.json::<Vec<Row>>()
            .await
            .map_err(|e| GatewayError::Parse(format!("row decode: {e}")))
    }

    async fn decode_single(resp: reqwest::Response) -> Result<Row, GatewayError> {
        let mut rows = Self::decode_rows(resp).await?;
        if rows.is_empty() {
            return Err(GatewayError::Parse(
                "write returned no representation".to_string(),
            ));
        }
        Ok(rows.swap_remove(0))
    }
}

#[async_trait]
impl TableBackend for TableClient {
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        opts: &SelectOptions,
    ) -> Result<Vec<Row>, GatewayError> {
        let url = build_url(&self.base_url, table, filters, opts);
        let resp = check_response(self.request(reqwest::Method::GET, &url).send().await?).await?;
        Self::decode_rows(resp).await
    }

    async fn insert(&self, table: &str, row: &Row) -> Result<Row, GatewayError> {
        let url = build_url(&self.base_url, table, &[], &SelectOptions::default());
        let resp = check_response(
            self.request(reqwest::Method::POST, &url)
                .header("Prefer", "return=representation")
                .json(&[row])
                .send()
                .await?,
        )
        .await?;
        Self::decode_single(resp).await
    }

    async fn insert_many(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, GatewayError> {
        let url = build_url(&self.base_url, table, &[], &SelectOptions::default());
        let resp = check_response(
            self.request(reqwest::Method::POST, &url)
                .header("Prefer", "return=representation")
                .json(rows)
                .send()
                .await?,
        )
        .await?;
        Self::decode_rows(resp).await
    }

    async fn upsert(&self, table: &str, row: &Row, on_conflict: &str) -> Result<Row, GatewayError> {
        let url = format!(
            "{}?on_conflict={}",
            build_url(&self.base_url, table, &[], &SelectOptions::default()),
            urlencoding::encode(on_conflict)
        );
        let resp = check_response(
            self.request(reqwest::Method::POST, &url)
                .header("Prefer", "resolution=merge-duplicates,return=representation")
                .json(&[row])
                .send()
                .await?,
        )
        .await?;
        Self::decode_single(resp).await
    }

    async fn patch(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &Row,
    ) -> Result<Vec<Row>, GatewayError> {
        let url = build_url(&self.base_url, table, filters, &SelectOptions::default());
        let resp = check_response(
            self.request(reqwest::Method::PATCH, &url)
                .header("Prefer", "return=representation")
                .json(patch)
                .send()
                .await?,
        )
        .await?;
        Self::decode_rows(resp).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, GatewayError> {
        let url = build_url(&self.base_url, table, filters, &SelectOptions::default());
        let resp = check_response(
            self.request(reqwest::Method::DELETE, &url)
                .header("Prefer", "return=representation")
                .send()
                .await?,
        )
        .await?;
        Self::decode_rows(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_strips_trailing_slash() {
        let client = TableClient::new("https://db.example.com/rest/v1/", "key");
        assert_eq!(client.base_url, "https://db.example.com/rest/v1");
    }

    #[tokio::test]
    async fn decode_single_rejects_empty_representation() {
        let resp = reqwest::Response::from(
            ::http::Response::builder()
                .status(201)
                .body("[]".to_string())
                .unwrap(),
        );
        let err = TableClient::decode_single(resp).await.unwrap_err();
        assert!(matches!(err, GatewayError::Parse(_)));
    }

    #[tokio::test]
    async fn decode_rows_parses_representation() {
        let resp = reqwest::Response::from(
            ::http::Response::builder()
                .status(200)
                .body(r#"[{"id":"jam-1","name":"Space Race"}]"#.to_string())
                .unwrap(),
        );
        let rows = TableClient::decode_rows(resp).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id").unwrap(), "jam-1");
    }
}
