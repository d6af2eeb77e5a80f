//! Country lookup with simulated, cancellable network latency

use crate::config::SourceSettings;
use crate::fetch::{CancellationToken, FetchError, SuggestionSource};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Maximum matches returned per lookup
pub const MAX_MATCHES: usize = 20;

/// A country suggestion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
}

impl Country {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Stable key
    pub fn key(&self) -> String {
        self.code.clone()
    }

    /// Display label, e.g. "Poland (PL)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.code.to_lowercase().contains(needle)
    }
}

/// Built-in country table
pub const COUNTRIES: &[(&str, &str)] = &[
    ("PL", "Poland"),
    ("DE", "Germany"),
    ("FR", "France"),
    ("ES", "Spain"),
    ("IT", "Italy"),
    ("NL", "Netherlands"),
    ("BE", "Belgium"),
    ("SE", "Sweden"),
    ("NO", "Norway"),
    ("DK", "Denmark"),
    ("IE", "Ireland"),
    ("CZ", "Czechia"),
    ("SK", "Slovakia"),
    ("LT", "Lithuania"),
    ("LV", "Latvia"),
    ("EE", "Estonia"),
    ("AT", "Austria"),
    ("HU", "Hungary"),
    ("RO", "Romania"),
    ("BG", "Bulgaria"),
];

/// Country search over [`COUNTRIES`] that behaves like a remote API
pub struct CountrySearch {
    countries: Vec<Country>,
    latency: RangeInclusive<u64>,
}

impl CountrySearch {
    /// Search with 150–600 ms of simulated latency
    pub fn new() -> Self {
        Self::with_latency(150..=600)
    }

    /// Search with a custom latency range in milliseconds
    pub fn with_latency(latency: RangeInclusive<u64>) -> Self {
        Self {
            countries: COUNTRIES
                .iter()
                .map(|(code, name)| Country::new(*code, *name))
                .collect(),
            latency,
        }
    }

    /// Search configured from settings
    pub fn with_settings(settings: &SourceSettings) -> Self {
        let (min, max) = (settings.min_latency_ms, settings.max_latency_ms);
        Self::with_latency(min.min(max)..=min.max(max))
    }

    /// Synchronous match, as the remote side would compute it
    pub fn search(&self, query: &str) -> Vec<Country> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return vec![];
        }

        self.countries
            .iter()
            .filter(|c| c.matches(&needle))
            .take(MAX_MATCHES)
            .cloned()
            .collect()
    }

    fn sample_latency(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.latency.clone());
        Duration::from_millis(ms)
    }
}

impl Default for CountrySearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuggestionSource<Country> for CountrySearch {
    fn name(&self) -> &str {
        "countries"
    }

    async fn fetch(
        &self,
        query: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<Country>, FetchError> {
        if query.trim().is_empty() {
            return Ok(vec![]);
        }

        // Fast-fail if already cancelled
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let latency = self.sample_latency();
        tokio::select! {
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            _ = tokio::time::sleep(latency) => {}
        }

        Ok(self.search(query))
    }
}
