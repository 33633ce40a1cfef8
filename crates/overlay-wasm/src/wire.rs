//! JSON shapes accepted from JS.
//!
//! Menus and multi-select configs arrive as camelCase JSON and are turned
//! into the core types here, so parsing is testable without a browser.

use overlay_core::menu::{Menu, MenuItem};
use overlay_select::{InputKey, SelectInput};
use serde::Deserialize;

// ─── Menus ───────────────────────────────────────────────────────────────

/// `{"className": "...", "items": [{"type": "action", "key": "cut", "label": "Cut"}, ...]}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MenuJson {
    #[serde(default)]
    class_name: Option<String>,
    items: Vec<ItemJson>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum ItemJson {
    Action {
        key: String,
        label: String,
        #[serde(default)]
        disabled: bool,
    },
    Divider,
    SubMenu {
        key: String,
        label: String,
        items: Vec<ItemJson>,
    },
}

impl From<ItemJson> for MenuItem {
    fn from(item: ItemJson) -> Self {
        match item {
            ItemJson::Action {
                key,
                label,
                disabled,
            } => MenuItem::action(key, label).disabled(disabled),
            ItemJson::Divider => MenuItem::divider(),
            ItemJson::SubMenu { key, label, items } => {
                MenuItem::submenu(key, label, items.into_iter().map(MenuItem::from).collect())
            }
        }
    }
}

pub fn parse_menu(json: &str) -> Result<Menu, String> {
    let parsed: MenuJson = serde_json::from_str(json).map_err(|e| format!("Invalid menu: {e}"))?;
    let mut menu = parsed.items.into_iter().fold(Menu::new(), |menu, item| menu.item(item.into()));
    if let Some(class) = parsed.class_name {
        menu = menu.class_name(class);
    }
    Ok(menu)
}

// ─── Multi-select ────────────────────────────────────────────────────────

/// Construction / update payload of a string multi-select.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectConfig {
    pub options: Vec<String>,
    /// Present: selection is controlled by JS.
    pub selected_items: Option<Vec<String>>,
    pub default_selected_items: Vec<String>,
    /// Focus is controlled by JS when true.
    pub focus_controlled: bool,
    pub focused_item: Option<String>,
    pub default_focused_item: Option<String>,
    pub fixed_values: Vec<String>,
    pub placeholder: Option<String>,
    pub pills_focusable: bool,
    pub hide_close_button: bool,
    pub disabled: bool,
    pub disabled_tooltip: Option<String>,
    pub auto_focus: bool,
    pub show_dropdown_arrow: bool,
    /// Enables drag-to-reorder.
    pub reorderable: bool,
}

pub fn parse_select_config(json: &str) -> Result<SelectConfig, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid multi-select config: {e}"))
}

/// `{"type": "keyDown", "key": "Enter"}`, `{"type": "dragOver", "index": 2}`, ...
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum InputJson {
    Focus,
    Blur,
    InputChanged { value: String },
    InputClicked,
    KeyDown { key: String },
    ContainerMouseDown {
        #[serde(rename = "onContainer")]
        on_container: bool,
    },
    OptionHovered { index: usize },
    OptionClicked { index: usize },
    PillClicked { index: usize },
    PillDeleteMouseDown { index: usize },
    DragStart { index: usize },
    DragOver { index: usize },
    DragEnter { index: usize },
    Drop { index: usize },
    DragEnd,
    OuterClick,
}

impl From<InputJson> for SelectInput {
    fn from(input: InputJson) -> Self {
        match input {
            InputJson::Focus => SelectInput::Focus,
            InputJson::Blur => SelectInput::Blur,
            InputJson::InputChanged { value } => SelectInput::InputChanged(value),
            InputJson::InputClicked => SelectInput::InputClicked,
            InputJson::KeyDown { key } => SelectInput::KeyDown(InputKey::from_dom(&key)),
            InputJson::ContainerMouseDown { on_container } => {
                SelectInput::ContainerMouseDown { on_container }
            }
            InputJson::OptionHovered { index } => SelectInput::OptionHovered(index),
            InputJson::OptionClicked { index } => SelectInput::OptionClicked(index),
            InputJson::PillClicked { index } => SelectInput::PillClicked(index),
            InputJson::PillDeleteMouseDown { index } => SelectInput::PillDeleteMouseDown(index),
            InputJson::DragStart { index } => SelectInput::DragStart(index),
            InputJson::DragOver { index } => SelectInput::DragOver(index),
            InputJson::DragEnter { index } => SelectInput::DragEnter(index),
            InputJson::Drop { index } => SelectInput::Drop(index),
            InputJson::DragEnd => SelectInput::DragEnd,
            InputJson::OuterClick => SelectInput::OuterClick,
        }
    }
}

pub fn parse_select_input(json: &str) -> Result<SelectInput, String> {
    serde_json::from_str::<InputJson>(json)
        .map(SelectInput::from)
        .map_err(|e| format!("Invalid multi-select input: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn menu_json_builds_nested_items() {
        let menu = parse_menu(
            r#"{"className": "layer-menu", "items": [
                {"type": "action", "key": "cut", "label": "Cut"},
                {"type": "divider"},
                {"type": "subMenu", "key": "more", "label": "More", "items": [
                    {"type": "action", "key": "lock", "label": "Lock", "disabled": true}
                ]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(menu.class_name.as_deref(), Some("layer-menu"));
        assert_eq!(menu.items[0].label(), Some("Cut"));
        assert_eq!(menu.items[1].key(), None);
        let (lock, path) = menu.find_action("lock").unwrap();
        assert_eq!(lock.key(), Some("lock"));
        assert_eq!(path, vec!["lock".to_string(), "more".to_string()]);
        assert!(menu.activate("lock").is_none());
        assert!(menu.activate("cut").is_some());
    }

    #[test]
    fn bad_menu_reports_error() {
        let err = parse_menu(r#"{"items": [{"type": "button"}]}"#).unwrap_err();
        assert!(err.starts_with("Invalid menu:"), "{err}");
    }

    #[test]
    fn select_config_defaults() {
        let config =
            parse_select_config(r#"{"options": ["a", "b"], "reorderable": true}"#).unwrap();
        assert_eq!(config.options, vec!["a", "b"]);
        assert!(config.reorderable);
        assert_eq!(config.selected_items, None);
        assert!(!config.focus_controlled);
    }

    #[test]
    fn select_inputs_parse() {
        assert_eq!(
            parse_select_input(r#"{"type": "keyDown", "key": "Backspace"}"#),
            Ok(SelectInput::KeyDown(InputKey::Backspace))
        );
        assert_eq!(
            parse_select_input(r#"{"type": "containerMouseDown", "onContainer": true}"#),
            Ok(SelectInput::ContainerMouseDown { on_container: true })
        );
        assert_eq!(
            parse_select_input(r#"{"type": "dragOver", "index": 3}"#),
            Ok(SelectInput::DragOver(3))
        );
        assert_eq!(
            parse_select_input(r#"{"type": "inputClicked"}"#),
            Ok(SelectInput::InputClicked)
        );
        assert!(parse_select_input(r#"{"type": "hover"}"#).is_err());
    }
}
