//! Debounce primitive
//!
//! Coalesces a rapidly changing value into a single downstream update that is
//! emitted only once the value has been stable for a fixed delay.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

/// Default quiet period before a value is forwarded
pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// State shared between the debouncer and its timer task
struct Shared<T> {
    /// Bumped on every feed/cancel; a timer only fires for its own generation
    generation: u64,
    on_settled: Callback<T>,
}

/// Timer-based debouncer
///
/// Every call to [`Debouncer::feed`] restarts the timer. When the timer runs
/// out without being restarted, the settled callback receives the latest
/// value. Must be used from within a Tokio runtime.
pub struct Debouncer<T> {
    delay: Duration,
    shared: Arc<Mutex<Shared<T>>>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer that invokes `on_settled` with each settled value
    pub fn new<F>(delay: Duration, on_settled: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            delay,
            shared: Arc::new(Mutex::new(Shared {
                generation: 0,
                on_settled: Arc::new(on_settled),
            })),
            pending: None,
        }
    }

    /// Create a debouncer whose settled values are delivered on a channel
    pub fn channel(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self::new(delay, move |value| {
            let _ = tx.send(value);
        });
        (debouncer, rx)
    }

    /// Feed a new value, discarding any update still waiting to fire
    pub fn feed(&mut self, value: T) {
        let generation = {
            let mut shared = self.shared.lock();
            shared.generation = shared.generation.wrapping_add(1);
            shared.generation
        };
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }

        trace!("debounce restarted (generation {})", generation);

        let shared = self.shared.clone();
        let delay = self.delay;
        // Even a zero delay goes through a spawned task, so the update is never synchronous.
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let shared = shared.lock();
            if shared.generation == generation {
                trace!("debounce settled (generation {})", generation);
                (shared.on_settled)(value);
            }
        }));
    }

    /// Drop any pending update without emitting it
    pub fn cancel(&mut self) {
        {
            let mut shared = self.shared.lock();
            shared.generation = shared.generation.wrapping_add(1);
        }
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<T> Debouncer<T> {
    /// Quiet period before a value settles
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a fed value is still waiting to settle
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        {
            let mut shared = self.shared.lock();
            shared.generation = shared.generation.wrapping_add(1);
        }
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
