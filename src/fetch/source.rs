//! Suggestion source contract

use async_trait::async_trait;
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors a suggestion lookup can end with
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The lookup observed its cancellation token. Never shown to the user.
    #[error("lookup cancelled")]
    Cancelled,
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {0}")]
    Http(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("{0}")]
    Failed(String),
}

impl FetchError {
    /// Whether this error only reports a superseded lookup
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

/// Asynchronous lookup behind an autocomplete widget
///
/// Implementations must return [`FetchError::Cancelled`] promptly once
/// `cancel` fires, and `Ok(vec![])` (not an error) when nothing matches.
#[async_trait]
pub trait SuggestionSource<T>: Send + Sync {
    /// Source name, used in logs
    fn name(&self) -> &str {
        "custom"
    }

    /// Fetch suggestions for a query
    async fn fetch(&self, query: &str, cancel: CancellationToken) -> Result<Vec<T>, FetchError>;
}

/// Adapts a plain async function into a [`SuggestionSource`]
pub struct FnSource<F> {
    name: String,
    func: F,
}

impl<F> FnSource<F> {
    pub fn new(func: F) -> Self {
        Self {
            name: "fn".to_string(),
            func,
        }
    }

    pub fn named(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<T, F, Fut> SuggestionSource<T> for FnSource<F>
where
    T: Send + 'static,
    F: Fn(String, CancellationToken) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>, FetchError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: &str, cancel: CancellationToken) -> Result<Vec<T>, FetchError> {
        (self.func)(query.to_string(), cancel).await
    }
}
