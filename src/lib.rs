//! Typeahead-RS: a debounced, cancelable, race-safe autocomplete pipeline
//!
//! Keystrokes are debounced, the settled query is looked up through a
//! caller-supplied [`SuggestionSource`], superseded lookups are cancelled, and
//! only the result of the most recent lookup ever reaches the suggestion
//! panel.

pub mod config;
pub mod debounce;
pub mod fetch;
pub mod sources;
pub mod widget;

pub use config::{AutocompleteConfig, Settings};
pub use debounce::Debouncer;
pub use fetch::{CancellationToken, FetchCoordinator, FetchError, FnSource, SuggestionSource};
pub use widget::{Autocomplete, Key, PanelState, View};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
