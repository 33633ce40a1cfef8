//! Reorderable multi-select engine.
//!
//! `MultiSelect` owns the interaction state of one control (typed text,
//! open list, highlight, focus, drag gesture) and nothing else. The
//! selection, options and focused pill come in through `MultiSelectProps`
//! and every change goes back out through the props' callbacks: the engine
//! never edits `selected_items` itself.
//!
//! Hosts translate DOM events into `SelectInput`s, feed them to `handle`,
//! apply the returned `EventResponse` to the native event, and paint
//! `render()`.

use crate::combobox::{Combobox, InputKey};
use crate::drag::DragState;
use crate::error::{SelectError, SelectResult};
use crate::view::{DropdownView, InputView, MultiSelectView, OptionView, PillView};
use serde::Serialize;
use std::fmt::Display;
use std::rc::Rc;

pub type ItemKey<T> = Rc<dyn Fn(&T) -> String>;
pub type ItemHandler<T> = Rc<dyn Fn(&T)>;
pub type FilterFn<T> = Rc<dyn Fn(&[T], &str) -> Vec<T>>;

/// What `on_select` wants the option list to do afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectResponse {
    #[default]
    Close,
    KeepOpen,
}

impl From<bool> for SelectResponse {
    fn from(close: bool) -> Self {
        if close {
            SelectResponse::Close
        } else {
            SelectResponse::KeepOpen
        }
    }
}

impl From<()> for SelectResponse {
    fn from(_: ()) -> Self {
        SelectResponse::Close
    }
}

// ─── Props ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MultiSelectProps<T> {
    pub options: Vec<T>,
    /// Current selection, in the user's order.
    pub selected_items: Vec<T>,
    /// Pill shown as selected when `pills_focusable` is set.
    pub focused_item: Option<T>,
    /// Selected items that never get a delete affordance.
    pub fixed_values: Vec<T>,
    /// Identity of an item; must be injective over the options.
    pub item_key: ItemKey<T>,
    pub filter_options: FilterFn<T>,
    pub render_option: Rc<dyn Fn(&T) -> String>,
    pub render_selected_item: Rc<dyn Fn(&T, usize) -> String>,
    pub on_select: Rc<dyn Fn(&T) -> SelectResponse>,
    pub on_unselect: ItemHandler<T>,
    /// Without it pills are not draggable at all.
    pub on_reorder: Option<Rc<dyn Fn(usize, usize)>>,
    pub on_focus_item: Option<ItemHandler<T>>,
    pub on_input_value_change: Option<Rc<dyn Fn(&str)>>,
    pub on_blur: Option<Rc<dyn Fn()>>,
    pub on_outer_click: Option<Rc<dyn Fn()>>,
    /// Click on the text input.
    pub on_click: Option<Rc<dyn Fn()>>,
    pub placeholder: Option<String>,
    pub pills_focusable: bool,
    pub hide_close_button: bool,
    pub is_disabled: bool,
    pub disabled_tooltip: Option<String>,
    pub auto_focus: bool,
    pub show_dropdown_arrow: bool,
}

impl<T: Display + Clone + 'static> MultiSelectProps<T> {
    /// Props keyed and labelled by `Display`.
    pub fn new(options: Vec<T>) -> Self {
        Self::with_key(options, |item: &T| item.to_string())
    }
}

impl<T: Clone + 'static> MultiSelectProps<T> {
    /// Props keyed by `item_key`. Labels default to the key and filtering
    /// to a case-insensitive substring match on it.
    pub fn with_key(options: Vec<T>, item_key: impl Fn(&T) -> String + 'static) -> Self {
        let item_key: ItemKey<T> = Rc::new(item_key);
        let (filter_key, option_key, pill_key) =
            (item_key.clone(), item_key.clone(), item_key.clone());
        Self {
            options,
            selected_items: Vec::new(),
            focused_item: None,
            fixed_values: Vec::new(),
            item_key,
            filter_options: Rc::new(move |options: &[T], input: &str| {
                substring_filter(options, input, &*filter_key)
            }),
            render_option: Rc::new(move |item: &T| option_key(item)),
            render_selected_item: Rc::new(move |item: &T, _: usize| pill_key(item)),
            on_select: Rc::new(|_: &T| SelectResponse::Close),
            on_unselect: Rc::new(|_: &T| {}),
            on_reorder: None,
            on_focus_item: None,
            on_input_value_change: None,
            on_blur: None,
            on_outer_click: None,
            on_click: None,
            placeholder: None,
            pills_focusable: false,
            hide_close_button: false,
            is_disabled: false,
            disabled_tooltip: None,
            auto_focus: false,
            show_dropdown_arrow: false,
        }
    }

    pub fn selected_items(mut self, items: Vec<T>) -> Self {
        self.selected_items = items;
        self
    }

    pub fn focused_item(mut self, item: Option<T>) -> Self {
        self.focused_item = item;
        self
    }

    pub fn fixed_values(mut self, items: Vec<T>) -> Self {
        self.fixed_values = items;
        self
    }

    pub fn filter_options(mut self, filter: impl Fn(&[T], &str) -> Vec<T> + 'static) -> Self {
        self.filter_options = Rc::new(filter);
        self
    }

    pub fn render_option(mut self, render: impl Fn(&T) -> String + 'static) -> Self {
        self.render_option = Rc::new(render);
        self
    }

    pub fn render_selected_item(
        mut self,
        render: impl Fn(&T, usize) -> String + 'static,
    ) -> Self {
        self.render_selected_item = Rc::new(render);
        self
    }

    /// `handler` may return `()`, a `bool` (false keeps the list open) or a
    /// `SelectResponse`.
    pub fn on_select<R: Into<SelectResponse>>(
        mut self,
        handler: impl Fn(&T) -> R + 'static,
    ) -> Self {
        self.on_select = Rc::new(move |item: &T| handler(item).into());
        self
    }

    pub fn on_unselect(mut self, handler: impl Fn(&T) + 'static) -> Self {
        self.on_unselect = Rc::new(handler);
        self
    }

    pub fn on_reorder(mut self, handler: impl Fn(usize, usize) + 'static) -> Self {
        self.on_reorder = Some(Rc::new(handler));
        self
    }

    pub fn on_focus_item(mut self, handler: impl Fn(&T) + 'static) -> Self {
        self.on_focus_item = Some(Rc::new(handler));
        self
    }

    pub fn on_input_value_change(mut self, handler: impl Fn(&str) + 'static) -> Self {
        self.on_input_value_change = Some(Rc::new(handler));
        self
    }

    pub fn on_blur(mut self, handler: impl Fn() + 'static) -> Self {
        self.on_blur = Some(Rc::new(handler));
        self
    }

    pub fn on_outer_click(mut self, handler: impl Fn() + 'static) -> Self {
        self.on_outer_click = Some(Rc::new(handler));
        self
    }

    pub fn on_click(mut self, handler: impl Fn() + 'static) -> Self {
        self.on_click = Some(Rc::new(handler));
        self
    }

    pub fn placeholder(mut self, text: &str) -> Self {
        self.placeholder = Some(text.to_string());
        self
    }

    pub fn pills_focusable(mut self, value: bool) -> Self {
        self.pills_focusable = value;
        self
    }

    pub fn hide_close_button(mut self, value: bool) -> Self {
        self.hide_close_button = value;
        self
    }

    /// Disable the control, optionally explaining why in a tooltip.
    pub fn disabled(mut self, tooltip: Option<&str>) -> Self {
        self.is_disabled = true;
        self.disabled_tooltip = tooltip.map(str::to_string);
        self
    }

    pub fn auto_focus(mut self, value: bool) -> Self {
        self.auto_focus = value;
        self
    }

    pub fn show_dropdown_arrow(mut self, value: bool) -> Self {
        self.show_dropdown_arrow = value;
        self
    }

    pub fn key_of(&self, item: &T) -> String {
        (self.item_key)(item)
    }

    fn contains_key(&self, items: &[T], key: &str) -> bool {
        items.iter().any(|other| self.key_of(other) == key)
    }
}

/// Keep options whose key contains `input`, ignoring case. Blank input
/// keeps everything.
pub fn substring_filter<T: Clone>(
    options: &[T],
    input: &str,
    item_key: &dyn Fn(&T) -> String,
) -> Vec<T> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return options.to_vec();
    }
    options
        .iter()
        .filter(|item| item_key(item).to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

// ─── Input ───────────────────────────────────────────────────────────────

/// A DOM interaction, already resolved to the pill or option it hit.
/// Pill indices refer to the displayed order, option indices to the
/// filtered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectInput {
    Focus,
    Blur,
    InputChanged(String),
    InputClicked,
    KeyDown(InputKey),
    /// Mouse-down inside the pill area; `on_container` is false when the
    /// press landed on the input or a pill.
    ContainerMouseDown { on_container: bool },
    OptionHovered(usize),
    OptionClicked(usize),
    /// Click on a pill's contents.
    PillClicked(usize),
    PillDeleteMouseDown(usize),
    DragStart(usize),
    DragOver(usize),
    DragEnter(usize),
    Drop(usize),
    DragEnd,
    OuterClick,
}

/// What the host must do with the native event and the input element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub prevent_default: bool,
    pub stop_propagation: bool,
    pub focus_input: bool,
    pub blur_input: bool,
}

impl EventResponse {
    fn prevent() -> Self {
        Self {
            prevent_default: true,
            ..Self::default()
        }
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────

pub struct MultiSelect<T> {
    props: MultiSelectProps<T>,
    combobox: Combobox,
    focused: bool,
    drag: DragState,
}

impl<T: Clone + 'static> MultiSelect<T> {
    pub fn new(props: MultiSelectProps<T>) -> Self {
        let mut select = Self {
            props,
            combobox: Combobox::new(),
            focused: false,
            drag: DragState::Idle,
        };
        if select.props.auto_focus && !select.props.is_disabled {
            select.focus();
        }
        select
    }

    pub fn props(&self) -> &MultiSelectProps<T> {
        &self.props
    }

    /// Replace the props, keeping typed text, focus and any drag gesture.
    pub fn set_props(&mut self, props: MultiSelectProps<T>) {
        self.props = props;
    }

    pub fn combobox(&self) -> &Combobox {
        &self.combobox
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    pub fn filtered_options(&self) -> Vec<T> {
        (self.props.filter_options)(&self.props.options, self.combobox.input_value())
    }

    /// The option Enter would select.
    pub fn highlighted_item(&self) -> Option<T> {
        let index = self.combobox.highlighted_index()?;
        self.filtered_options().get(index).cloned()
    }

    /// Selection in display order: the drag preview while dragging.
    pub fn displayed_items(&self) -> SelectResult<Vec<T>> {
        self.drag.preview(&self.props.selected_items)
    }

    pub fn is_dropdown_visible(&self) -> bool {
        self.combobox.is_open() && !self.filtered_options().is_empty()
    }

    /// Apply one interaction. A disabled control ignores everything.
    pub fn handle(&mut self, input: &SelectInput) -> SelectResult<EventResponse> {
        if self.props.is_disabled {
            log::trace!("multi-select disabled, ignoring {input:?}");
            return Ok(EventResponse::default());
        }
        let response = self.dispatch(input);
        self.combobox.ensure_highlight();
        response
    }

    fn dispatch(&mut self, input: &SelectInput) -> SelectResult<EventResponse> {
        log::trace!("multi-select input: {input:?}");
        match input {
            SelectInput::Focus => self.focus(),
            SelectInput::Blur => self.blur(),
            SelectInput::InputChanged(text) => {
                self.combobox.set_input_value(text);
                if let Some(on_change) = &self.props.on_input_value_change {
                    on_change(text);
                }
            }
            SelectInput::InputClicked => {
                if let Some(on_click) = &self.props.on_click {
                    on_click();
                }
            }
            SelectInput::KeyDown(key) => return Ok(self.key_down(*key)),
            SelectInput::ContainerMouseDown { on_container } => {
                if *on_container {
                    self.focus();
                    return Ok(EventResponse {
                        prevent_default: true,
                        focus_input: true,
                        ..EventResponse::default()
                    });
                }
            }
            SelectInput::OptionHovered(index) => {
                let len = self.filtered_options().len();
                check_index(*index, len)?;
                self.combobox.set_highlighted_index(Some(*index));
            }
            SelectInput::OptionClicked(index) => {
                let options = self.filtered_options();
                let item = options.get(*index).ok_or(SelectError::IndexOutOfRange {
                    index: *index,
                    len: options.len(),
                })?;
                self.select(item);
            }
            SelectInput::PillClicked(index) => {
                let item = self.pill_at(*index)?;
                if let Some(on_focus_item) = self.props.on_focus_item.clone() {
                    on_focus_item(&item);
                    self.combobox.close_menu();
                }
            }
            SelectInput::PillDeleteMouseDown(index) => {
                let item = self.pill_at(*index)?;
                if self.is_deletable(&item) {
                    (self.props.on_unselect)(&item);
                    return Ok(EventResponse::prevent());
                }
            }
            SelectInput::DragStart(index) => {
                if self.props.on_reorder.is_some() {
                    let item = self.pill_at(*index)?;
                    self.drag.start(self.props.key_of(&item), *index);
                }
            }
            SelectInput::DragOver(index) | SelectInput::DragEnter(index) => {
                if self.props.on_reorder.is_some() {
                    check_index(*index, self.props.selected_items.len())?;
                    if self.drag.over(*index) {
                        return Ok(EventResponse {
                            prevent_default: true,
                            stop_propagation: true,
                            ..EventResponse::default()
                        });
                    }
                }
            }
            // Only here so the pill is a valid drop target; the move is
            // committed on drag-end.
            SelectInput::Drop(_) => {}
            SelectInput::DragEnd => self.drag_end()?,
            SelectInput::OuterClick => {
                self.combobox.close_menu();
                if let Some(on_outer_click) = &self.props.on_outer_click {
                    on_outer_click();
                }
            }
        }
        Ok(EventResponse::default())
    }

    fn key_down(&mut self, key: InputKey) -> EventResponse {
        let mut response = EventResponse::default();
        match key {
            InputKey::Escape => {
                self.blur();
                response.blur_input = true;
                response.stop_propagation = true;
            }
            InputKey::Backspace | InputKey::Delete => {
                if self.combobox.is_input_empty()
                    && let Some(last) = self.props.selected_items.last()
                {
                    (self.props.on_unselect)(last);
                }
            }
            InputKey::Enter => match self.highlighted_item() {
                Some(item) if self.combobox.is_open() => {
                    self.select(&item);
                    response.prevent_default = true;
                }
                Some(_) => {}
                None => {
                    self.blur();
                    response.blur_input = true;
                }
            },
            InputKey::ArrowUp | InputKey::ArrowDown => {
                let count = self.filtered_options().len();
                self.combobox.move_highlight(count, key == InputKey::ArrowDown);
                response.prevent_default = true;
            }
            InputKey::Other => {}
        }
        response
    }

    fn focus(&mut self) {
        if self.focused {
            return;
        }
        self.focused = true;
        self.combobox.open_menu();
    }

    /// Leaves the typed text in place.
    fn blur(&mut self) {
        if !self.focused {
            return;
        }
        self.focused = false;
        self.combobox.close_menu();
        if let Some(on_blur) = &self.props.on_blur {
            on_blur();
        }
    }

    fn select(&mut self, item: &T) {
        let key = self.props.key_of(item);
        if self.props.contains_key(&self.props.selected_items, &key) {
            log::trace!("{key} already selected");
            return;
        }
        let response = (self.props.on_select)(item);
        // The filter text is cleared even when the list stays open.
        self.combobox.reset();
        if response == SelectResponse::KeepOpen {
            self.combobox.open_menu();
        }
        log::debug!("selected {key} ({response:?})");
    }

    fn drag_end(&mut self) -> SelectResult<()> {
        let Some((from, to)) = self.drag.end()? else {
            return Ok(());
        };
        let on_reorder = self
            .props
            .on_reorder
            .clone()
            .ok_or(SelectError::ReorderUnavailable)?;
        log::debug!("reorder {from} -> {to}");
        on_reorder(from, to);
        Ok(())
    }

    fn pill_at(&self, index: usize) -> SelectResult<T> {
        let items = self.displayed_items()?;
        let len = items.len();
        items
            .into_iter()
            .nth(index)
            .ok_or(SelectError::IndexOutOfRange { index, len })
    }

    fn is_deletable(&self, item: &T) -> bool {
        !self.props.hide_close_button
            && !self
                .props
                .contains_key(&self.props.fixed_values, &self.props.key_of(item))
    }

    // ─── Render ──────────────────────────────────────────────────────────

    pub fn render(&self) -> SelectResult<MultiSelectView> {
        let props = &self.props;
        let dragged = self.drag.dragged_key();
        let focused_key = props
            .focused_item
            .as_ref()
            .filter(|_| props.pills_focusable)
            .map(|item| props.key_of(item));

        let pills = self
            .displayed_items()?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let key = props.key_of(item);
                let is_dragged = dragged == Some(key.as_str());
                PillView {
                    label: (props.render_selected_item)(item, index),
                    index,
                    selected: is_dragged || focused_key.as_deref() == Some(key.as_str()),
                    draggable: props.on_reorder.is_some() && !is_dragged,
                    deletable: self.is_deletable(item),
                    clickable: props.on_focus_item.is_some(),
                    key,
                }
            })
            .collect();

        let options = self.filtered_options();
        let highlighted = self.combobox.highlighted_index();
        let dropdown = (self.combobox.is_open() && !options.is_empty()).then(|| DropdownView {
            selected_key: highlighted
                .and_then(|index| options.get(index))
                .map(|item| props.key_of(item)),
            options: options
                .iter()
                .enumerate()
                .map(|(index, item)| OptionView {
                    key: props.key_of(item),
                    label: (props.render_option)(item),
                    index,
                    highlighted: highlighted == Some(index),
                })
                .collect(),
        });

        Ok(MultiSelectView {
            focused: self.focused,
            disabled: props.is_disabled,
            tooltip: props.disabled_tooltip.clone().filter(|_| props.is_disabled),
            pills,
            input: InputView {
                value: self.combobox.input_value().to_string(),
                placeholder: props.placeholder.clone().filter(|_| props.selected_items.is_empty()),
                disabled: props.is_disabled,
                auto_focus: props.auto_focus,
            },
            dropdown,
            show_dropdown_arrow: props.show_dropdown_arrow,
        })
    }
}

fn check_index(index: usize, len: usize) -> SelectResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(SelectError::IndexOutOfRange { index, len })
    }
}
