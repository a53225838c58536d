//! Workflow catalogue REST client
//!
//! [`WorkflowApi`] is the seam the controller talks through; [`HttpApi`] is the
//! reqwest implementation against the `/api` endpoints. Tests swap in an
//! in-memory implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{DeckError, Result};
use crate::filters::ListQuery;
use crate::model::{CategoryMap, ListPage, Stats};
use crate::view::sanitize_inline;

/// Everything the client needs from the backend
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// `GET /categories`
    async fn categories(&self) -> Result<Vec<String>>;

    /// `GET /category-mappings`
    async fn category_mappings(&self) -> Result<CategoryMap>;

    /// `GET /stats`
    async fn stats(&self) -> Result<Stats>;

    /// `GET /workflows?q&trigger&complexity&active_only&page&per_page`
    async fn list_workflows(&self, query: &ListQuery) -> Result<ListPage>;

    /// `GET /workflows/{filename}` → raw definition
    async fn workflow_json(&self, filename: &str) -> Result<serde_json::Value>;

    /// `GET /workflows/{filename}/diagram` → diagram source text
    async fn workflow_diagram(&self, filename: &str) -> Result<String>;

    /// `GET /workflows/{filename}/download` → file body
    async fn download(&self, filename: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MappingsResponse {
    #[serde(default)]
    mappings: std::collections::HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawJsonResponse {
    #[serde(default)]
    raw_json: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct DiagramResponse {
    #[serde(default)]
    diagram: String,
}

/// Server error body: `{ error, message, code, details }`, or a bare
/// `{ detail }` from framework-level errors
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(alias = "detail")]
    details: Option<serde_json::Value>,
    code: Option<String>,
}

/// reqwest-backed [`WorkflowApi`]
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client for `base_url` (e.g. `http://127.0.0.1:8000/api`)
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(DeckError::config(format!(
                "api base URL must start with http:// or https:// (got '{}')",
                base_url
            )));
        }

        let mut builder =
            Client::builder().user_agent(concat!("flowdeck/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DeckError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The filename goes in as a single encoded path segment
    pub fn workflow_url(&self, filename: &str, suffix: &str) -> String {
        format!(
            "{}/workflows/{}{}",
            self.base_url,
            urlencoding::encode(filename),
            suffix
        )
    }

    async fn fetch(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| DeckError::network(url, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(err) => {
                if let Some(code) = &err.code {
                    debug!(code = %code, "server error code");
                }
                if let Some(details) = &err.details {
                    debug!(details = %details, "server error details");
                }
                err.message
                    .or_else(|| err.details.map(|d| d.to_string()))
                    .unwrap_or_else(|| status.to_string())
            }
            Err(_) if !body.trim().is_empty() => body.trim().chars().take(200).collect(),
            Err(_) => status.to_string(),
        };
        let message = sanitize_inline(&message);
        warn!(status = status.as_u16(), url = %url, message = %message, "API request failed");
        Err(DeckError::http(status.as_u16(), url, message))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.fetch(url, query).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DeckError::network(url, e))?;
        serde_json::from_slice(&bytes).map_err(|e| DeckError::decode(url, e.to_string()))
    }
}

#[async_trait]
impl WorkflowApi for HttpApi {
    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<String>> {
        let body: CategoriesResponse = self.get_json(&self.url("/categories"), &[]).await?;
        Ok(body.categories)
    }

    #[instrument(skip(self))]
    async fn category_mappings(&self) -> Result<CategoryMap> {
        let body: MappingsResponse = self.get_json(&self.url("/category-mappings"), &[]).await?;
        Ok(CategoryMap::new(body.mappings))
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> Result<Stats> {
        self.get_json(&self.url("/stats"), &[]).await
    }

    #[instrument(skip(self, query), fields(page = query.page, per_page = query.per_page))]
    async fn list_workflows(&self, query: &ListQuery) -> Result<ListPage> {
        let page: ListPage = self.get_json(&self.url("/workflows"), &query.params()).await?;
        debug!(
            returned = page.workflows.len(),
            total = page.total,
            pages = page.pages,
            "listing page received"
        );
        Ok(page)
    }

    #[instrument(skip(self))]
    async fn workflow_json(&self, filename: &str) -> Result<serde_json::Value> {
        let url = self.workflow_url(filename, "");
        let body: RawJsonResponse = self.get_json(&url, &[]).await?;
        // Some servers ship the definition as an encoded string
        Ok(match body.raw_json {
            serde_json::Value::String(s) => {
                serde_json::from_str(&s).unwrap_or(serde_json::Value::String(s))
            }
            other => other,
        })
    }

    #[instrument(skip(self))]
    async fn workflow_diagram(&self, filename: &str) -> Result<String> {
        let url = self.workflow_url(filename, "/diagram");
        let body: DiagramResponse = self.get_json(&url, &[]).await?;
        Ok(body.diagram)
    }

    #[instrument(skip(self))]
    async fn download(&self, filename: &str) -> Result<Vec<u8>> {
        let url = self.workflow_url(filename, "/download");
        let response = self.fetch(&url, &[]).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DeckError::network(&url, e))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_base_url() {
        assert!(matches!(
            HttpApi::new("ftp://example.org/api"),
            Err(DeckError::Config { .. })
        ));
    }

    #[test]
    fn test_workflow_url_encodes_filename() {
        let api = HttpApi::new("http://localhost:8000/api/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000/api");
        assert_eq!(
            api.workflow_url("my flow#1.json", "/diagram"),
            "http://localhost:8000/api/workflows/my%20flow%231.json/diagram"
        );
    }
}
