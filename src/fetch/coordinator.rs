//! Single-flight lookup coordination with cancellation and stale-result rejection

use super::source::{FetchError, SuggestionSource};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Outcome of a lookup, tagged with the generation that issued it
#[derive(Debug)]
pub struct Completion<T> {
    pub generation: u64,
    pub query: String,
    pub result: Result<Vec<T>, FetchError>,
}

/// What the owner should do with a completion
#[derive(Debug, PartialEq)]
pub enum Resolution<T> {
    /// Current lookup succeeded
    Suggestions(Vec<T>),
    /// Current lookup failed with a user-facing error
    Failed(FetchError),
    /// Superseded, cancelled, or already resolved; leave state untouched
    Discarded,
}

struct InFlight {
    generation: u64,
    query: String,
    cancel: CancellationToken,
    started: Instant,
}

type CompletionHandler<T> = Arc<dyn Fn(Completion<T>) + Send + Sync>;

/// Owns at most one active lookup at a time
///
/// Starting a lookup cancels the previous one and bumps the generation.
/// Completions are delivered through the handler and must be passed back
/// to [`FetchCoordinator::resolve`], which only lets the current generation
/// through. Cancellation is cooperative: the source is signalled, never
/// aborted, so a source that ignores its token still cannot apply stale
/// results.
pub struct FetchCoordinator<T> {
    source: Arc<dyn SuggestionSource<T>>,
    on_complete: CompletionHandler<T>,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl<T: Send + 'static> FetchCoordinator<T> {
    /// Create a coordinator that hands completions to `on_complete`
    pub fn new<F>(source: Arc<dyn SuggestionSource<T>>, on_complete: F) -> Self
    where
        F: Fn(Completion<T>) + Send + Sync + 'static,
    {
        Self {
            source,
            on_complete: Arc::new(on_complete),
            generation: 0,
            in_flight: None,
        }
    }

    /// Create a coordinator whose completions arrive on a channel
    pub fn channel(
        source: Arc<dyn SuggestionSource<T>>,
    ) -> (Self, mpsc::UnboundedReceiver<Completion<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = Self::new(source, move |completion| {
            let _ = tx.send(completion);
        });
        (coordinator, rx)
    }

    /// Start a lookup for `query`, cancelling whatever is in flight
    ///
    /// The previous token is cancelled before the new lookup is spawned.
    pub fn start(&mut self, query: impl Into<String>) -> u64 {
        let query = query.into();
        self.cancel();

        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let cancel = CancellationToken::new();

        debug!(
            "Starting lookup #{} for '{}' on {}",
            generation,
            query,
            self.source.name()
        );

        self.in_flight = Some(InFlight {
            generation,
            query: query.clone(),
            cancel: cancel.clone(),
            started: Instant::now(),
        });

        let source = self.source.clone();
        let on_complete = self.on_complete.clone();
        tokio::spawn(async move {
            // The source runs in its own task so a panic still completes this generation.
            let lookup = {
                let query = query.clone();
                tokio::spawn(async move { source.fetch(&query, cancel).await })
            };
            let result = match lookup.await {
                Ok(result) => result,
                Err(err) if err.is_panic() => {
                    warn!("Lookup #{} for '{}' panicked", generation, query);
                    Err(FetchError::Failed("lookup failed unexpectedly".to_string()))
                }
                Err(_) => Err(FetchError::Cancelled),
            };
            on_complete(Completion {
                generation,
                query,
                result,
            });
        });

        generation
    }
}

impl<T> FetchCoordinator<T> {
    /// Signal cancellation to the in-flight lookup, if any
    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(
                "Cancelling lookup #{} for '{}'",
                in_flight.generation, in_flight.query
            );
            in_flight.cancel.cancel();
        }
    }

    /// Latest issued generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `generation` belongs to the active lookup
    pub fn is_current(&self, generation: u64) -> bool {
        self.in_flight
            .as_ref()
            .map(|in_flight| in_flight.generation == generation)
            .unwrap_or(false)
    }

    /// Whether a lookup is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Query of the in-flight lookup
    pub fn pending_query(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|in_flight| in_flight.query.as_str())
    }

    /// Decide whether a completion may touch state
    pub fn resolve(&mut self, completion: Completion<T>) -> Resolution<T> {
        if !self.is_current(completion.generation) {
            debug!(
                "Discarding stale lookup #{} for '{}' (current #{})",
                completion.generation, completion.query, self.generation
            );
            return Resolution::Discarded;
        }

        let elapsed = self
            .in_flight
            .take()
            .map(|in_flight| in_flight.started.elapsed());

        match completion.result {
            Ok(items) => {
                debug!(
                    "Lookup #{} for '{}' returned {} suggestions in {:?}",
                    completion.generation,
                    completion.query,
                    items.len(),
                    elapsed.unwrap_or_default()
                );
                Resolution::Suggestions(items)
            }
            // Already taken off the in-flight slot, so loading ends here too.
            Err(FetchError::Cancelled) => Resolution::Discarded,
            Err(err) => {
                warn!(
                    "Lookup #{} for '{}' failed: {}",
                    completion.generation, completion.query, err
                );
                Resolution::Failed(err)
            }
        }
    }
}

impl<T> Drop for FetchCoordinator<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
