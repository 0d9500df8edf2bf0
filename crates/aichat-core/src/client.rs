//! HTTP plumbing for the chat-bot backend.

use anyhow::{Context, Result};
use reqwest::Response;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use url::Url;

use crate::config::Config;
use crate::error::{CONNECTIVITY_ERROR, ClientError, ClientErrorKind, ClientResult};
use crate::providers::{AI_PROVIDER_HEADER, Provider};

/// Standard User-Agent header for aichat requests.
pub const USER_AGENT: &str = concat!("aichat/", env!("CARGO_PKG_VERSION"));

/// Backend client bound to one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    placeholder_path: String,
}

impl ApiClient {
    /// Creates a client with default timeouts.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url) -> Result<Self> {
        Self::with_http(base_url, default_builder().build()?)
    }

    /// Creates a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &Config, base_url_override: Option<&str>) -> Result<Self> {
        let base_url = config.effective_base_url(base_url_override)?;

        let mut builder = default_builder();
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build HTTP client")?;

        let mut client = Self::with_http(base_url, http)?;
        client.placeholder_path.clone_from(&config.placeholder_path);
        Ok(client)
    }

    fn with_http(mut base_url: Url, http: reqwest::Client) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Base URL cannot be used as a base: {base_url}");
        }
        // Relative joins replace the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            placeholder_path: "code-review-placeholder.txt".to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an endpoint path relative to the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| {
                ClientError::new(ClientErrorKind::Transport, CONNECTIVITY_ERROR)
                    .with_details(format!("invalid endpoint '{path}': {e}"))
            })
    }

    /// POSTs a JSON body and returns the successful response.
    pub(crate) async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: Url,
        provider: Provider,
        body: &T,
    ) -> ClientResult<Response> {
        tracing::debug!(%url, provider = provider.id(), "POST json");
        let response = self
            .http
            .post(url)
            .header(AI_PROVIDER_HEADER, provider.id())
            .json(body)
            .send()
            .await?;
        ensure_success(response).await
    }

    /// POSTs a plain-text body and returns the successful response.
    pub(crate) async fn post_text(
        &self,
        url: Url,
        provider: Provider,
        body: String,
    ) -> ClientResult<Response> {
        tracing::debug!(%url, provider = provider.id(), bytes = body.len(), "POST text");
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .header(AI_PROVIDER_HEADER, provider.id())
            .body(body)
            .send()
            .await?;
        ensure_success(response).await
    }

    /// Fetches the code placeholder text.
    ///
    /// Failures are logged and reported as `None`; the placeholder is a
    /// convenience and never blocks a review.
    pub async fn load_placeholder(&self) -> Option<String> {
        match self.fetch_placeholder().await {
            Ok(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(err) => {
                tracing::warn!(
                    details = err.details.as_deref().unwrap_or_default(),
                    "failed to load code placeholder"
                );
                None
            }
        }
    }

    async fn fetch_placeholder(&self) -> ClientResult<String> {
        let url = self.endpoint(&self.placeholder_path)?;
        let response = self.http.get(url).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.text().await?)
    }
}

fn default_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder().user_agent(USER_AGENT)
}

/// Converts a non-2xx response into the generic connectivity error.
///
/// The body is read for diagnostics only; it is never shown to the user.
async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(%status, body = %body, "backend returned error status");
    Err(ClientError::http_status(status.as_u16(), &body))
}
