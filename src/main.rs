//! Typeahead-RS: interactive autocomplete demo
//!
//! Reads widget commands from stdin and prints the suggestion panel as
//! timers and lookups complete.

use anyhow::{anyhow, bail, Result};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use typeahead_rs::{
    config::{self, Settings, SourceKind},
    sources::{Country, CountrySearch, HttpSource},
    widget::{FocusTarget, Key},
    Autocomplete, SuggestionSource,
};

/// A scripted user interaction
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Type(String),
    Append(String),
    Backspace,
    Key(Key),
    Hover(usize),
    Click(usize),
    Focus,
    Blur,
    Outside,
    Wait(u64),
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let (name, arg) = match line.split_once(' ') {
            Some((name, arg)) => (name, Some(arg)),
            None => (line.trim(), None),
        };
        let index = || -> Result<usize> {
            let arg = arg.ok_or_else(|| anyhow!("{} needs an index", name))?;
            Ok(arg.trim().parse()?)
        };

        let command = match name {
            "type" => Command::Type(arg.unwrap_or_default().to_string()),
            "append" => Command::Append(arg.unwrap_or_default().to_string()),
            "backspace" | "bs" => Command::Backspace,
            "down" => Command::Key(Key::ArrowDown),
            "up" => Command::Key(Key::ArrowUp),
            "enter" => Command::Key(Key::Enter),
            "esc" | "escape" => Command::Key(Key::Escape),
            "hover" => Command::Hover(index()?),
            "click" => Command::Click(index()?),
            "focus" => Command::Focus,
            "blur" => Command::Blur,
            "outside" => Command::Outside,
            "wait" => {
                let ms = arg.ok_or_else(|| anyhow!("wait needs milliseconds"))?;
                Command::Wait(ms.trim().parse()?)
            }
            "show" | "" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command: {}", other),
        };
        Ok(command)
    }
}

enum Next {
    Line(Option<String>),
    Updated(bool),
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings_path = config::locate();
    let settings = config::load_from(settings_path.as_deref())?;

    // Initialize logging
    init_logging(&settings);

    info!("Starting Typeahead-RS v{}", typeahead_rs::VERSION);
    match settings_path {
        Some(ref path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    let source = build_source(&settings)?;
    info!(
        "Using {} source (min_length={}, debounce={}ms)",
        source.name(),
        settings.autocomplete.min_length,
        settings.autocomplete.debounce_ms
    );

    let mut widget = Autocomplete::builder(source)
        .config(settings.autocomplete.clone())
        .key(Country::key)
        .label(Country::label)
        .on_select(|country: &Country| {
            println!("Selected: {}", country.label());
        })
        .build();

    print_usage();
    print!("{}", widget.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let next = tokio::select! {
            line = lines.next_line() => Next::Line(line?),
            changed = widget.next_event() => Next::Updated(changed),
        };

        let line = match next {
            Next::Updated(true) => {
                widget.pump();
                print!("{}", widget.view());
                continue;
            }
            Next::Updated(false) => continue,
            Next::Line(None) => break,
            Next::Line(Some(line)) => line,
        };

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("error: {}", e);
                continue;
            }
        };

        if !run(&mut widget, command).await {
            break;
        }
        widget.pump();
        print!("{}", widget.view());
    }

    info!("Shutting down");
    Ok(())
}

/// Apply one command; returns false to quit
async fn run(widget: &mut Autocomplete<Country>, command: Command) -> bool {
    match command {
        Command::Type(text) => widget.input(text),
        Command::Append(text) => widget.type_text(&text),
        Command::Backspace => widget.backspace(),
        Command::Key(key) => {
            widget.key_down(key);
        }
        Command::Hover(index) => widget.hover(index),
        Command::Click(index) => {
            widget.click(index);
        }
        Command::Focus => widget.focus(),
        Command::Blur => widget.blur(FocusTarget::Outside),
        Command::Outside => widget.pointer_down_outside(),
        Command::Wait(ms) => {
            let deadline = tokio::time::Instant::now() + Duration::from_millis(ms);
            while tokio::time::timeout_at(deadline, widget.next_event())
                .await
                .is_ok()
            {}
        }
        Command::Show => {}
        Command::Help => print_usage(),
        Command::Quit => return false,
    }
    true
}

fn init_logging(settings: &Settings) {
    let default = if settings.general.debug {
        "debug"
    } else {
        settings.general.log_filter.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_source(settings: &Settings) -> Result<Arc<dyn SuggestionSource<Country>>> {
    let source: Arc<dyn SuggestionSource<Country>> = match settings.source.kind {
        SourceKind::Countries => Arc::new(CountrySearch::with_settings(&settings.source)),
        SourceKind::Http => {
            let endpoint = settings
                .source
                .endpoint
                .as_deref()
                .ok_or_else(|| anyhow!("source.endpoint is required for the http source"))?;
            Arc::new(HttpSource::<Country>::with_settings(
                endpoint,
                &settings.source.query_param,
                &settings.outgoing,
            )?)
        }
    };
    Ok(source)
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
Typeahead-RS v{}
Start typing a country (e.g. "type po", "type ge", "type fr").

COMMANDS:
    type <text>      Replace the input text
    append <text>    Append to the input text
    backspace        Delete the last character
    down | up        Move the highlight (reopens a closed panel)
    enter            Commit the highlighted suggestion
    esc              Close the panel
    hover <i>        Highlight suggestion i
    click <i>        Commit suggestion i
    focus | blur     Focus or blur the input
    outside          Click outside the widget
    wait <ms>        Let timers and lookups run
    show             Print the panel
    quit             Exit

ENVIRONMENT VARIABLES:
    TYPEAHEAD_SETTINGS_PATH  Path to typeahead.yml
    TYPEAHEAD_DEBUG          Enable debug logging (true/false)
    TYPEAHEAD_MIN_LENGTH     Minimum query length
    TYPEAHEAD_DEBOUNCE_MS    Debounce delay in milliseconds
    TYPEAHEAD_ENDPOINT       Use a JSON endpoint instead of the built-in table
"#,
        typeahead_rs::VERSION
    );
}
