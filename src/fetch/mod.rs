//! Suggestion lookups
//!
//! The source contract a caller implements, and the coordinator that keeps
//! at most one lookup active and rejects stale results.

mod coordinator;
mod source;

pub use coordinator::{Completion, FetchCoordinator, Resolution};
pub use source::{FetchError, FnSource, SuggestionSource};
pub use tokio_util::sync::CancellationToken;
