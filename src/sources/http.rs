//! JSON suggestion endpoint over HTTP

use crate::config::OutgoingSettings;
use crate::fetch::{CancellationToken, FetchError, SuggestionSource};
use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;
use url::Url;

/// Fetches `GET {endpoint}?{param}={query}` and decodes a JSON array of `T`
///
/// The request races the cancellation token, so a superseded lookup drops
/// its connection instead of waiting for the response.
pub struct HttpSource<T> {
    client: Client,
    endpoint: Url,
    query_param: String,
    timeout: Duration,
    _item: PhantomData<fn() -> T>,
}

impl<T> HttpSource<T> {
    /// Create a source with default outgoing settings
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_settings(endpoint, "query", &OutgoingSettings::default())
    }

    /// Create a source with custom outgoing settings
    pub fn with_settings(
        endpoint: &str,
        query_param: &str,
        settings: &OutgoingSettings,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        if !settings.request_timeout.is_finite() || settings.request_timeout <= 0.0 {
            bail!(
                "outgoing.request_timeout must be a positive number of seconds, got {}",
                settings.request_timeout
            );
        }
        let timeout = Duration::from_secs_f64(settings.request_timeout);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (key, value) in &settings.extra_headers {
            headers.insert(
                HeaderName::from_bytes(key.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            query_param: query_param.to_string(),
            timeout,
            _item: PhantomData,
        })
    }

    /// URL requested for a query
    pub fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair(&self.query_param, query);
        url
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::Http(status.as_u16())
    } else if err.is_decode() {
        FetchError::Decode(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

#[async_trait]
impl<T> SuggestionSource<T> for HttpSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &str {
        self.endpoint.host_str().unwrap_or("http")
    }

    async fn fetch(&self, query: &str, cancel: CancellationToken) -> Result<Vec<T>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let request = self
            .client
            .get(self.request_url(query))
            .timeout(self.timeout)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            response = request => response.map_err(classify)?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            body = response.bytes() => body.map_err(classify)?,
        };

        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
