//! One-shot HTTP GET used for the schema and claims documents.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{OnixError, Result};

/// Fetch a document by URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return its body, parsed as JSON when possible.
    async fn get(&self, url: &str) -> Result<Value>;
}

/// [`Fetcher`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing client (proxies, custom TLS, timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Value> {
        let url = with_default_scheme(url);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.text().await?;

        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

/// Prefix `http://` when `url` carries no scheme.
pub(crate) fn with_default_scheme(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

/// Claims endpoint URL with the access token and optional organization.
pub(crate) fn claims_request_url(base: &str, token: &str, organization: Option<&str>) -> Result<String> {
    let mut url = url::Url::parse(&with_default_scheme(base))
        .map_err(|e| OnixError::InvalidState(format!("invalid claims url {}: {}", base, e)))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("access_token", token);
        if let Some(organization) = organization {
            query.append_pair("organization", organization);
        }
    }
    Ok(url.into())
}
