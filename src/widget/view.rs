//! Presentation-neutral view of the widget, including ARIA state

use super::autocomplete::Autocomplete;
use super::state::PanelState;
use std::fmt;

/// One line of the suggestion panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Loading,
    Error(String),
    NoResults,
    Option(OptionRow),
}

/// A selectable suggestion (`role="option"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRow {
    pub id: String,
    pub key: String,
    pub label: String,
    /// `aria-selected`
    pub selected: bool,
}

/// Snapshot of everything an embedding UI needs to render the widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub input_id: String,
    pub listbox_id: String,
    pub input: String,
    pub placeholder: String,
    /// `aria-expanded`
    pub expanded: bool,
    /// `aria-activedescendant`
    pub active_descendant: Option<String>,
    /// Panel rows; empty when collapsed
    pub rows: Vec<Row>,
}

impl<T> Autocomplete<T> {
    /// Build the current view
    pub fn view(&self) -> View {
        let ids = self.ids();
        let state = self.state();

        let rows = match state {
            PanelState::Closed => Vec::new(),
            PanelState::Loading => vec![Row::Loading],
            PanelState::Error(ref message) => vec![Row::Error(message.clone())],
            PanelState::Empty => vec![Row::NoResults],
            PanelState::Results(_) => self
                .visible()
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    Row::Option(OptionRow {
                        id: ids.option(index),
                        key: self.item_key(item),
                        label: self.item_label(item),
                        selected: self.highlighted() == Some(index),
                    })
                })
                .collect(),
        };

        let active_descendant = match state {
            PanelState::Results(_) => self.highlighted().map(|index| ids.option(index)),
            _ => None,
        };

        View {
            input_id: ids.input.clone(),
            listbox_id: ids.listbox.clone(),
            input: self.input_text().to_string(),
            placeholder: self.config().placeholder.clone(),
            expanded: state.is_open(),
            active_descendant,
            rows,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.input.is_empty() {
            writeln!(f, "[ {} ]", self.placeholder)?;
        } else {
            writeln!(f, "[ {} ]", self.input)?;
        }

        for row in &self.rows {
            match row {
                Row::Loading => writeln!(f, "  Loading…")?,
                Row::Error(message) => writeln!(f, "  ! {}", message)?,
                Row::NoResults => writeln!(f, "  No results")?,
                Row::Option(option) => {
                    let marker = if option.selected { '>' } else { ' ' };
                    writeln!(f, "{} {}", marker, option.label)?;
                }
            }
        }
        Ok(())
    }
}
