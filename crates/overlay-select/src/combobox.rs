//! Text-input combobox state: the typed filter text, whether the option
//! list is open, and which option is highlighted.

use serde::Serialize;

/// Keys the multi-select input reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    Escape,
    Backspace,
    Delete,
    Enter,
    ArrowUp,
    ArrowDown,
    Other,
}

impl InputKey {
    /// Map a `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Escape" | "Esc" => InputKey::Escape,
            "Backspace" => InputKey::Backspace,
            "Delete" | "Del" => InputKey::Delete,
            "Enter" => InputKey::Enter,
            "ArrowUp" | "Up" => InputKey::ArrowUp,
            "ArrowDown" | "Down" => InputKey::ArrowDown,
            _ => InputKey::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Combobox {
    input_value: String,
    is_open: bool,
    highlighted_index: Option<usize>,
}

impl Default for Combobox {
    fn default() -> Self {
        Self::new()
    }
}

impl Combobox {
    /// Closed, empty, with the first option highlighted.
    pub fn new() -> Self {
        Self {
            input_value: String::new(),
            is_open: false,
            highlighted_index: Some(0),
        }
    }

    pub fn input_value(&self) -> &str {
        &self.input_value
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn highlighted_index(&self) -> Option<usize> {
        self.highlighted_index
    }

    /// True when the text is empty or whitespace only.
    pub fn is_input_empty(&self) -> bool {
        self.input_value.trim().is_empty()
    }

    pub fn open_menu(&mut self) {
        self.is_open = true;
    }

    pub fn close_menu(&mut self) {
        self.is_open = false;
        self.highlighted_index = None;
    }

    /// Clear the text, close the list and drop the highlight.
    pub fn reset(&mut self) {
        self.input_value.clear();
        self.close_menu();
    }

    /// Typing replaces the text, opens the list and drops the highlight.
    pub fn set_input_value(&mut self, value: &str) {
        self.input_value = value.to_string();
        self.is_open = true;
        self.highlighted_index = None;
    }

    pub fn set_highlighted_index(&mut self, index: Option<usize>) {
        self.highlighted_index = index;
    }

    /// Highlight the first option when text is typed and nothing is
    /// highlighted yet.
    pub fn ensure_highlight(&mut self) {
        if self.highlighted_index.is_none() && !self.is_input_empty() {
            self.highlighted_index = Some(0);
        }
    }

    /// Move the highlight one step through `count` options, wrapping at
    /// both ends. Opens the list.
    pub fn move_highlight(&mut self, count: usize, forward: bool) {
        self.is_open = true;
        if count == 0 {
            self.highlighted_index = None;
            return;
        }
        self.highlighted_index = Some(match (self.highlighted_index, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i.min(count - 1) + count - 1) % count,
        });
    }
}
