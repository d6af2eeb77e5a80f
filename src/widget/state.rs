//! Panel states, input keys and highlight navigation

/// What the suggestion panel currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    Closed,
    Loading,
    Results(usize),
    Empty,
    Error(String),
}

impl PanelState {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Keys the widget reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Other,
}

impl Key {
    /// Parse a DOM-style key name
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowDown" | "Down" => Self::ArrowDown,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            _ => Self::Other,
        }
    }
}

/// Where focus went when the input lost it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    /// Another element inside the widget (e.g. the list)
    Inside,
    /// Anything unrelated to the widget
    Outside,
}

/// Next highlight position, wrapping to the first entry
pub fn next_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(i) => (i + 1) % len,
        None => 0,
    })
}

/// Previous highlight position, wrapping to the last entry
pub fn prev_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(i) => (i % len + len - 1) % len,
        None => len - 1,
    })
}
