//! Serializable render output of a multi-select.
//!
//! Everything a host needs to paint the control; the wasm bridge ships it
//! to JS as JSON.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSelectView {
    pub focused: bool,
    pub disabled: bool,
    /// Wraps the whole control; present only while disabled with a reason.
    pub tooltip: Option<String>,
    pub pills: Vec<PillView>,
    pub input: InputView,
    /// `None` while the option list is hidden.
    pub dropdown: Option<DropdownView>,
    pub show_dropdown_arrow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PillView {
    pub key: String,
    pub label: String,
    /// Position in the displayed (drag-previewed) order.
    pub index: usize,
    pub selected: bool,
    pub draggable: bool,
    pub deletable: bool,
    pub clickable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputView {
    pub value: String,
    pub placeholder: Option<String>,
    pub disabled: bool,
    pub auto_focus: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropdownView {
    pub options: Vec<OptionView>,
    /// Key of the highlighted option.
    pub selected_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub key: String,
    pub label: String,
    pub index: usize,
    pub highlighted: bool,
}

impl MultiSelectView {
    /// Pill labels in display order.
    pub fn pill_labels(&self) -> Vec<&str> {
        self.pills.iter().map(|pill| pill.label.as_str()).collect()
    }

    /// Option labels in display order; empty while the list is hidden.
    pub fn option_labels(&self) -> Vec<&str> {
        self.dropdown
            .iter()
            .flat_map(|dropdown| dropdown.options.iter().map(|option| option.label.as_str()))
            .collect()
    }
}
