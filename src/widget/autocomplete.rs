//! Debounced, cancelable autocomplete widget

use super::state::{next_index, prev_index, FocusTarget, Key, PanelState};
use crate::config::AutocompleteConfig;
use crate::debounce::Debouncer;
use crate::fetch::{Completion, FetchCoordinator, Resolution, SuggestionSource};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

type ItemText<T> = Box<dyn Fn(&T) -> String + Send + Sync>;
type SelectHandler<T> = Box<dyn FnMut(&T) + Send>;

/// Timer and lookup outcomes, applied on the widget's owner
enum Event<T> {
    Settled(String),
    Fetched(Completion<T>),
}

/// DOM-style ids used for ARIA wiring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetIds {
    pub input: String,
    pub listbox: String,
}

impl WidgetIds {
    fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        let base = format!("typeahead-{}", &simple[..8]);
        Self {
            input: format!("{}-input", base),
            listbox: format!("{}-listbox", base),
        }
    }

    /// Id of the option at `index`
    pub fn option(&self, index: usize) -> String {
        format!("{}-opt-{}", self.listbox, index)
    }
}

/// Builder for [`Autocomplete`]
pub struct AutocompleteBuilder<T> {
    source: Arc<dyn SuggestionSource<T>>,
    config: AutocompleteConfig,
    key: Option<ItemText<T>>,
    label: Option<ItemText<T>>,
    on_select: Option<SelectHandler<T>>,
}

impl<T: Send + 'static> AutocompleteBuilder<T> {
    pub fn config(mut self, config: AutocompleteConfig) -> Self {
        self.config = config;
        self
    }

    /// Stable identifier of an item
    pub fn key<F>(mut self, key: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.key = Some(Box::new(key));
        self
    }

    /// Display label of an item; also written into the input on commit
    pub fn label<F>(mut self, label: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.label = Some(Box::new(label));
        self
    }

    /// Called exactly once per committed item
    pub fn on_select<F>(mut self, on_select: F) -> Self
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.on_select = Some(Box::new(on_select));
        self
    }

    /// Build the widget. Must be called from within a Tokio runtime.
    ///
    /// An initial input that already meets the minimum length is looked up
    /// right away, as if it had just settled.
    pub fn build(self) -> Autocomplete<T> {
        let (tx, events) = mpsc::unbounded_channel();

        let settled_tx = tx.clone();
        let debouncer = Debouncer::new(self.config.debounce(), move |query| {
            let _ = settled_tx.send(Event::Settled(query));
        });
        let coordinator = FetchCoordinator::new(self.source, move |completion| {
            let _ = tx.send(Event::Fetched(completion));
        });

        let label = self
            .label
            .unwrap_or_else(|| Box::new(|_: &T| String::new()));
        let key = self.key.unwrap_or_else(|| Box::new(|_: &T| String::new()));
        let on_select = self.on_select.unwrap_or_else(|| Box::new(|_: &T| {}));

        let input = self.config.initial_input.clone();
        let query = input.trim().to_string();

        let mut widget = Autocomplete {
            config: self.config,
            ids: WidgetIds::generate(),
            input,
            fed: query.clone(),
            debounced: query,
            items: Vec::new(),
            open: false,
            highlight: None,
            error: None,
            has_lookup: false,
            debouncer,
            coordinator,
            events,
            key,
            label,
            on_select,
        };
        widget.lookup();
        widget
    }
}

/// Autocomplete pipeline: input → debounce → single-flight lookup → selection
///
/// The widget is driven by its owner: input events go through the methods
/// below, and timer/lookup outcomes are applied with [`Autocomplete::pump`]
/// or [`Autocomplete::next_event`]. Dropping the widget cancels any pending
/// debounce and in-flight lookup.
pub struct Autocomplete<T> {
    config: AutocompleteConfig,
    ids: WidgetIds,
    /// Raw input text
    input: String,
    /// Last trimmed query handed to the debouncer
    fed: String,
    /// Last settled query
    debounced: String,
    items: Vec<T>,
    open: bool,
    highlight: Option<usize>,
    error: Option<String>,
    /// A lookup has completed for the current debounced query
    has_lookup: bool,
    debouncer: Debouncer<String>,
    coordinator: FetchCoordinator<T>,
    events: mpsc::UnboundedReceiver<Event<T>>,
    key: ItemText<T>,
    label: ItemText<T>,
    on_select: SelectHandler<T>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl<T: Send + 'static> Autocomplete<T> {
    pub fn builder(source: Arc<dyn SuggestionSource<T>>) -> AutocompleteBuilder<T> {
        AutocompleteBuilder {
            source,
            config: AutocompleteConfig::default(),
            key: None,
            label: None,
            on_select: None,
        }
    }

    /// Replace the input text, as on every keystroke
    pub fn input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        let query = self.input.trim().to_string();

        if char_len(&query) < self.config.min_length {
            // Nothing a lookup returns now could be shown.
            self.coordinator.cancel();
            self.close();
        } else if !self.items.is_empty() {
            self.open = true;
        }

        if query != self.fed {
            self.fed = query.clone();
            self.debouncer.feed(query);
        }
    }

    /// Append text to the input
    pub fn type_text(&mut self, text: &str) {
        let next = format!("{}{}", self.input, text);
        self.input(next);
    }

    /// Remove the last character of the input
    pub fn backspace(&mut self) {
        let mut next = self.input.clone();
        next.pop();
        self.input(next);
    }

    /// Handle a key press; returns whether the widget consumed it
    pub fn key_down(&mut self, key: Key) -> bool {
        trace!("key {:?} in state {:?}", key, self.state());

        match key {
            Key::ArrowDown | Key::ArrowUp if !self.open => {
                let has_query = char_len(self.query()) >= self.config.min_length;
                if has_query && (self.has_lookup || !self.items.is_empty() || self.is_loading()) {
                    self.open = true;
                    true
                } else {
                    false
                }
            }
            Key::ArrowDown => match self.state() {
                PanelState::Results(n) => {
                    self.highlight = next_index(self.highlight, n);
                    true
                }
                _ => false,
            },
            Key::ArrowUp => match self.state() {
                PanelState::Results(n) => {
                    self.highlight = prev_index(self.highlight, n);
                    true
                }
                _ => false,
            },
            Key::Enter => match (self.state(), self.highlight) {
                (PanelState::Results(n), Some(index)) if index < n => {
                    self.commit(index);
                    true
                }
                _ => false,
            },
            Key::Escape => {
                let was_open = self.open;
                self.close();
                was_open
            }
            Key::Other => false,
        }
    }

    /// Input gained focus
    pub fn focus(&mut self) {
        if !self.items.is_empty() {
            self.open = true;
        }
    }

    /// Input lost focus
    pub fn blur(&mut self, target: FocusTarget) {
        if target == FocusTarget::Outside {
            self.close();
        }
    }

    /// Pointer pressed somewhere outside the widget
    pub fn pointer_down_outside(&mut self) {
        self.close();
    }

    /// Pointer moved over the option at `index`
    pub fn hover(&mut self, index: usize) {
        if let PanelState::Results(n) = self.state() {
            if index < n {
                self.highlight = Some(index);
            }
        }
    }

    /// Pointer pressed on the option at `index`; returns whether it committed
    pub fn click(&mut self, index: usize) -> bool {
        match self.state() {
            PanelState::Results(n) if index < n => {
                self.commit(index);
                true
            }
            _ => false,
        }
    }

    /// Apply every event that is already available
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            changed |= self.apply(event);
        }
        changed
    }

    /// Wait for the next timer or lookup event and apply it
    pub async fn next_event(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => self.apply(event),
            None => false,
        }
    }

    fn apply(&mut self, event: Event<T>) -> bool {
        match event {
            Event::Settled(query) => {
                // A later keystroke or a commit superseded this value.
                if query != self.input.trim() {
                    return false;
                }
                // Unchanged query whose lookup is settled or still running.
                if query == self.debounced && (self.has_lookup || self.is_loading()) {
                    return false;
                }
                debug!("Query settled: '{}'", query);
                self.debounced = query;
                self.lookup();
                true
            }
            Event::Fetched(completion) => match self.coordinator.resolve(completion) {
                Resolution::Suggestions(items) => {
                    self.items = items;
                    self.error = None;
                    self.open = true;
                    self.highlight = if self.visible_len() > 0 { Some(0) } else { None };
                    self.has_lookup = true;
                    true
                }
                Resolution::Failed(err) => {
                    self.error = Some(err.to_string());
                    self.items.clear();
                    self.open = true;
                    self.highlight = None;
                    self.has_lookup = true;
                    true
                }
                Resolution::Discarded => false,
            },
        }
    }

    /// Run the lookup step for the current debounced query
    fn lookup(&mut self) {
        if char_len(&self.debounced) < self.config.min_length {
            self.coordinator.cancel();
            self.items.clear();
            self.error = None;
            self.has_lookup = false;
            self.close();
            return;
        }

        self.coordinator.start(self.debounced.clone());
        self.error = None;
        self.has_lookup = false;
        self.open = true;
    }

    fn commit(&mut self, index: usize) {
        let Some(item) = self.items.get(index) else {
            return;
        };

        (self.on_select)(item);
        let label = (self.label)(item);
        debug!("Committed '{}'", label);

        // The label becomes the settled query directly so it is never looked up.
        self.debouncer.cancel();
        self.coordinator.cancel();
        let query = label.trim().to_string();
        self.fed = query.clone();
        self.debounced = query;
        self.input = label;
        self.close();
    }
}

impl<T> Autocomplete<T> {
    fn close(&mut self) {
        self.open = false;
        self.highlight = None;
    }

    fn visible_len(&self) -> usize {
        self.visible().len()
    }

    pub fn config(&self) -> &AutocompleteConfig {
        &self.config
    }

    pub fn ids(&self) -> &WidgetIds {
        &self.ids
    }

    /// Raw input text
    pub fn input_text(&self) -> &str {
        &self.input
    }

    /// Trimmed input text
    pub fn query(&self) -> &str {
        self.input.trim()
    }

    /// Last query that settled through the debouncer
    pub fn debounced_query(&self) -> &str {
        &self.debounced
    }

    /// Whether a keystroke is still waiting out the debounce delay
    pub fn is_debouncing(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Full suggestion set of the last applied lookup
    pub fn suggestions(&self) -> &[T] {
        &self.items
    }

    /// Suggestions truncated to `max_visible`
    pub fn visible(&self) -> &[T] {
        match self.config.max_visible {
            0 => &self.items,
            max => &self.items[..self.items.len().min(max)],
        }
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlight
    }

    pub fn highlighted_item(&self) -> Option<&T> {
        self.highlight.and_then(|i| self.visible().get(i))
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_loading(&self) -> bool {
        self.coordinator.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> PanelState {
        if !self.open {
            PanelState::Closed
        } else if self.is_loading() {
            PanelState::Loading
        } else if let Some(ref error) = self.error {
            PanelState::Error(error.clone())
        } else {
            match self.visible_len() {
                0 => PanelState::Empty,
                n => PanelState::Results(n),
            }
        }
    }

    pub(crate) fn item_key(&self, item: &T) -> String {
        (self.key)(item)
    }

    pub(crate) fn item_label(&self, item: &T) -> String {
        (self.label)(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{CancellationToken, FetchError, FnSource};
    use crate::sources::{Country, CountrySearch};
    use crate::widget::Row;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tokio::time::sleep;

    /// Wraps a source and records every query it is asked for
    struct Recording<T> {
        inner: Arc<dyn SuggestionSource<T>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl<T: Send + 'static> SuggestionSource<T> for Recording<T> {
        async fn fetch(&self, query: &str, cancel: CancellationToken) -> Result<Vec<T>, FetchError> {
            self.calls.lock().push(query.to_string());
            self.inner.fetch(query, cancel).await
        }
    }

    fn recording<T: Send + 'static>(
        inner: impl SuggestionSource<T> + 'static,
    ) -> (Arc<dyn SuggestionSource<T>>, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let source = Recording {
            inner: Arc::new(inner),
            calls: calls.clone(),
        };
        (Arc::new(source), calls)
    }

    /// Answers `{query}-0 .. {query}-{count}` after `latency_ms`; ignores cancellation
    fn numbered(count: usize, latency_ms: u64) -> impl SuggestionSource<String> {
        FnSource::new(move |query: String, _cancel: CancellationToken| async move {
            sleep(Duration::from_millis(latency_ms)).await;
            Ok::<Vec<String>, FetchError>((0..count).map(|i| format!("{}-{}", query, i)).collect())
        })
    }

    fn country_widget(
        latency_ms: u64,
    ) -> (Autocomplete<Country>, Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<Country>>>) {
        let (source, calls) = recording(CountrySearch::with_latency(latency_ms..=latency_ms));
        let picked = Arc::new(Mutex::new(Vec::new()));
        let sink = picked.clone();
        let widget = Autocomplete::builder(source)
            .key(Country::key)
            .label(Country::label)
            .on_select(move |c: &Country| sink.lock().push(c.clone()))
            .build();
        (widget, calls, picked)
    }

    fn string_widget(
        source: impl SuggestionSource<String> + 'static,
        config: AutocompleteConfig,
    ) -> (Autocomplete<String>, Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<String>>>) {
        let (source, calls) = recording(source);
        let picked = Arc::new(Mutex::new(Vec::new()));
        let sink = picked.clone();
        let widget = Autocomplete::builder(source)
            .config(config)
            .key(|s: &String| s.clone())
            .label(|s: &String| s.clone())
            .on_select(move |s: &String| sink.lock().push(s.clone()))
            .build();
        (widget, calls, picked)
    }

    /// Let `ms` milliseconds pass, applying events as they arrive
    async fn settle(widget: &mut Autocomplete<impl Send + 'static>, ms: u64) {
        for _ in 0..ms {
            sleep(Duration::from_millis(1)).await;
            widget.pump();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_country_pick() {
        let (mut widget, calls, picked) = country_widget(150);

        widget.input("p");
        sleep(Duration::from_millis(40)).await;
        widget.input("po");
        sleep(Duration::from_millis(40)).await;
        widget.input("pol");

        settle(&mut widget, 299).await;
        assert!(calls.lock().is_empty());
        assert_eq!(widget.state(), PanelState::Closed);

        settle(&mut widget, 2).await;
        assert_eq!(widget.debounced_query(), "pol");
        assert_eq!(widget.state(), PanelState::Loading);

        settle(&mut widget, 148).await;
        assert_eq!(*calls.lock(), vec!["pol".to_string()]);
        assert_eq!(widget.state(), PanelState::Loading);

        settle(&mut widget, 3).await;
        assert_eq!(widget.state(), PanelState::Results(1));
        assert_eq!(widget.highlighted(), Some(0));
        let view = widget.view();
        assert!(view.expanded);
        assert_eq!(view.active_descendant, Some(widget.ids().option(0)));
        match &view.rows[..] {
            [Row::Option(option)] => {
                assert_eq!(option.label, "Poland (PL)");
                assert_eq!(option.key, "PL");
                assert!(option.selected);
            }
            rows => panic!("unexpected rows: {:?}", rows),
        }

        assert!(widget.key_down(Key::Enter));
        assert_eq!(*picked.lock(), vec![Country::new("PL", "Poland")]);
        assert_eq!(widget.input_text(), "Poland (PL)");
        assert_eq!(widget.state(), PanelState::Closed);
        assert_eq!(widget.highlighted(), None);

        // Committing never looks up the label
        settle(&mut widget, 1000).await;
        assert_eq!(calls.lock().len(), 1);
        assert_eq!(widget.state(), PanelState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_never_fetches() {
        let (mut widget, calls, _) = country_widget(10);

        widget.input("p");
        settle(&mut widget, 1000).await;

        assert!(calls.lock().is_empty());
        assert_eq!(widget.state(), PanelState::Closed);
        assert!(widget.suggestions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_early_lookup_never_overwrites_later_one() {
        let source = FnSource::new(|query: String, _cancel: CancellationToken| async move {
            let latency = if query == "po" { 800 } else { 50 };
            sleep(Duration::from_millis(latency)).await;
            Ok::<_, FetchError>(vec![format!("{}!", query)])
        });
        let (mut widget, calls, _) = string_widget(source, AutocompleteConfig::default());

        widget.input("po");
        settle(&mut widget, 310).await;
        assert_eq!(widget.state(), PanelState::Loading);

        widget.input("pol");
        settle(&mut widget, 310).await;
        assert_eq!(*calls.lock(), vec!["po".to_string(), "pol".to_string()]);

        settle(&mut widget, 60).await;
        assert_eq!(widget.suggestions(), &["pol!".to_string()]);

        // "po" resolves now, after being cancelled; it must be ignored
        settle(&mut widget, 800).await;
        assert_eq!(widget.suggestions(), &["pol!".to_string()]);
        assert_eq!(widget.state(), PanelState::Results(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_lookup_is_cancelled() {
        let tokens: Arc<Mutex<Vec<CancellationToken>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = tokens.clone();
        let source = FnSource::new(move |_query: String, cancel: CancellationToken| {
            seen.lock().push(cancel.clone());
            async move {
                cancel.cancelled().await;
                Err::<Vec<String>, _>(FetchError::Cancelled)
            }
        });
        let (mut widget, _, _) = string_widget(source, AutocompleteConfig::default());

        widget.input("po");
        settle(&mut widget, 310).await;
        widget.input("pol");
        settle(&mut widget, 310).await;

        let tokens = tokens.lock();
        assert_eq!(tokens.len(), 2);
        assert!(tokens[0].is_cancelled());
        assert!(!tokens[1].is_cancelled());
        drop(tokens);

        assert_eq!(widget.state(), PanelState::Loading);
        assert_eq!(widget.error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keyboard_wraparound() {
        let (mut widget, _, _) = string_widget(numbered(3, 10), AutocompleteConfig::default());

        widget.input("ab");
        settle(&mut widget, 320).await;
        assert_eq!(widget.state(), PanelState::Results(3));
        assert_eq!(widget.highlighted(), Some(0));

        for _ in 0..3 {
            assert!(widget.key_down(Key::ArrowDown));
        }
        assert_eq!(widget.highlighted(), Some(0));

        assert!(widget.key_down(Key::ArrowUp));
        assert_eq!(widget.highlighted(), Some(2));
        assert_eq!(widget.highlighted_item().map(String::as_str), Some("ab-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_is_limited_to_visible_items() {
        let config = AutocompleteConfig {
            max_visible: 8,
            ..Default::default()
        };
        let (mut widget, _, _) = string_widget(numbered(12, 10), config);

        widget.input("ab");
        settle(&mut widget, 320).await;

        assert_eq!(widget.suggestions().len(), 12);
        assert_eq!(widget.state(), PanelState::Results(8));
        assert!(widget.key_down(Key::ArrowUp));
        assert_eq!(widget.highlighted(), Some(7));
        assert_eq!(widget.view().rows.len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_commit() {
        let (mut widget, calls, picked) =
            string_widget(numbered(3, 10), AutocompleteConfig::default());

        widget.input("ab");
        settle(&mut widget, 320).await;

        widget.hover(2);
        assert_eq!(widget.highlighted(), Some(2));
        widget.hover(9);
        assert_eq!(widget.highlighted(), Some(2));

        assert!(widget.click(1));
        assert_eq!(*picked.lock(), vec!["ab-1".to_string()]);
        assert_eq!(widget.input_text(), "ab-1");
        assert_eq!(widget.state(), PanelState::Closed);

        // Closed panel ignores further clicks
        assert!(!widget.click(1));
        assert_eq!(picked.lock().len(), 1);

        settle(&mut widget, 1000).await;
        assert_eq!(calls.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_shows_no_results() {
        let (mut widget, _, _) = string_widget(numbered(0, 10), AutocompleteConfig::default());

        widget.input("zz");
        settle(&mut widget, 320).await;

        assert_eq!(widget.state(), PanelState::Empty);
        assert_eq!(widget.highlighted(), None);
        assert_eq!(widget.view().rows, vec![Row::NoResults]);
        assert!(!widget.key_down(Key::Enter));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_shown_and_retyping_retries() {
        let source = FnSource::new(|query: String, _cancel: CancellationToken| async move {
            if query == "err" {
                Err(FetchError::Http(502))
            } else {
                Ok(vec![query])
            }
        });
        let (mut widget, calls, _) = string_widget(source, AutocompleteConfig::default());

        widget.input("err");
        settle(&mut widget, 320).await;
        assert_eq!(widget.state(), PanelState::Error("HTTP 502".to_string()));
        assert_eq!(widget.view().rows, vec![Row::Error("HTTP 502".to_string())]);

        widget.input("errs");
        settle(&mut widget, 320).await;
        assert_eq!(calls.lock().len(), 2);
        assert_eq!(widget.state(), PanelState::Results(1));
        assert_eq!(widget.error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_and_reopen_without_refetch() {
        let (mut widget, calls, _) = string_widget(numbered(3, 10), AutocompleteConfig::default());

        widget.input("ab");
        settle(&mut widget, 320).await;

        assert!(widget.key_down(Key::Escape));
        assert_eq!(widget.state(), PanelState::Closed);
        assert_eq!(widget.highlighted(), None);
        assert_eq!(widget.suggestions().len(), 3);

        assert!(widget.key_down(Key::ArrowDown));
        assert_eq!(widget.state(), PanelState::Results(3));
        assert_eq!(widget.view().active_descendant, None);
        assert!(widget.key_down(Key::ArrowDown));
        assert_eq!(widget.highlighted(), Some(0));

        widget.pointer_down_outside();
        assert_eq!(widget.state(), PanelState::Closed);

        widget.focus();
        assert_eq!(widget.state(), PanelState::Results(3));

        widget.blur(FocusTarget::Inside);
        assert!(widget.is_open());
        widget.blur(FocusTarget::Outside);
        assert!(!widget.is_open());

        settle(&mut widget, 1000).await;
        assert_eq!(calls.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_arrow_reopens_while_newer_lookup_is_pending() {
        let source = FnSource::new(|query: String, _cancel: CancellationToken| async move {
            let latency = if query == "abc" { 1000 } else { 10 };
            sleep(Duration::from_millis(latency)).await;
            Ok::<Vec<String>, FetchError>((0..2).map(|i| format!("{}-{}", query, i)).collect())
        });
        let (mut widget, _, _) = string_widget(source, AutocompleteConfig::default());

        widget.input("ab");
        settle(&mut widget, 320).await;
        assert_eq!(widget.state(), PanelState::Results(2));

        widget.input("abc");
        settle(&mut widget, 310).await;
        assert_eq!(widget.state(), PanelState::Loading);

        assert!(widget.key_down(Key::Escape));
        assert_eq!(widget.state(), PanelState::Closed);

        assert!(widget.key_down(Key::ArrowDown));
        assert!(widget.is_open());
        assert_eq!(widget.state(), PanelState::Loading);

        settle(&mut widget, 1000).await;
        assert_eq!(widget.state(), PanelState::Results(2));
        assert_eq!(widget.suggestions()[0], "abc-0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_arrow_does_not_reopen_for_short_query() {
        let (mut widget, _, _) = string_widget(numbered(2, 10), AutocompleteConfig::default());

        widget.input("ab");
        settle(&mut widget, 320).await;
        widget.input("a");
        assert_eq!(widget.state(), PanelState::Closed);

        assert!(!widget.key_down(Key::ArrowDown));
        assert_eq!(widget.state(), PanelState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_lookup_shows_error_and_recovers() {
        let source = FnSource::new(|query: String, _cancel: CancellationToken| async move {
            if query == "boom" {
                panic!("lookup exploded");
            }
            Ok::<Vec<String>, FetchError>(vec![query])
        });
        let (mut widget, _, _) = string_widget(source, AutocompleteConfig::default());

        widget.input("boom");
        settle(&mut widget, 400).await;
        assert!(matches!(widget.state(), PanelState::Error(_)));
        assert!(!widget.is_loading());

        widget.input("boomer");
        settle(&mut widget, 400).await;
        assert_eq!(widget.state(), PanelState::Results(1));
        assert_eq!(widget.error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shortening_query_clears_results() {
        let (mut widget, _, _) = string_widget(numbered(2, 200), AutocompleteConfig::default());

        widget.input("ab");
        settle(&mut widget, 320).await;
        assert_eq!(widget.state(), PanelState::Loading);

        widget.backspace();
        assert_eq!(widget.state(), PanelState::Closed);

        settle(&mut widget, 1000).await;
        assert_eq!(widget.debounced_query(), "a");
        assert!(widget.suggestions().is_empty());
        assert!(!widget.is_loading());
        assert_eq!(widget.state(), PanelState::Closed);
        assert!(!widget.key_down(Key::ArrowDown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_does_not_restart_debounce() {
        let (mut widget, calls, _) = string_widget(numbered(1, 10), AutocompleteConfig::default());

        widget.input("ab");
        sleep(Duration::from_millis(200)).await;
        widget.type_text(" ");
        settle(&mut widget, 110).await;

        assert_eq!(*calls.lock(), vec!["ab".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_input_is_looked_up() {
        let config = AutocompleteConfig {
            initial_input: "fr".to_string(),
            ..Default::default()
        };
        let (mut widget, calls, _) = string_widget(numbered(1, 10), config);

        assert_eq!(widget.state(), PanelState::Loading);
        settle(&mut widget, 20).await;

        assert_eq!(*calls.lock(), vec!["fr".to_string()]);
        assert_eq!(widget.state(), PanelState::Results(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_event_applies_one_event() {
        let (mut widget, _, _) = string_widget(numbered(1, 10), AutocompleteConfig::default());

        widget.input("ab");
        assert!(widget.next_event().await);
        assert_eq!(widget.state(), PanelState::Loading);
        assert!(widget.next_event().await);
        assert_eq!(widget.state(), PanelState::Results(1));
    }
}
