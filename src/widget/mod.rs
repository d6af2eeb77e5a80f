//! Autocomplete widget
//!
//! Ties the debouncer and the fetch coordinator to the selection state
//! machine: open/closed panel, keyboard highlight, and commits back to the
//! caller.

mod autocomplete;
mod state;
mod view;

pub use autocomplete::{Autocomplete, AutocompleteBuilder, WidgetIds};
pub use state::{next_index, prev_index, FocusTarget, Key, PanelState};
pub use view::{OptionRow, Row, View};
