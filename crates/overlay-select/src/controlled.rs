//! Controlled / uncontrolled wrapper around `MultiSelect`.
//!
//! Each piece of state picks its mode on its own:
//! - selection is controlled when `selected_items` is `Some`; otherwise the
//!   wrapper keeps it, seeded from `default_selected_items`;
//! - the focused pill is controlled when `base.on_focus_item` is set;
//!   otherwise the wrapper keeps it, seeded from `default_focused_item`.
//!
//! Caller callbacks still fire in uncontrolled mode, after the internal
//! state has been updated.

use crate::error::SelectResult;
use crate::multi_select::{
    EventResponse, MultiSelect, MultiSelectProps, SelectInput, SelectResponse,
};
use crate::view::MultiSelectView;
use std::cell::RefCell;
use std::rc::Rc;

pub struct XMultiSelectProps<T> {
    /// Everything except the selection. `base.selected_items` is ignored;
    /// `base.focused_item` is read only when focus is controlled.
    pub base: MultiSelectProps<T>,
    pub selected_items: Option<Vec<T>>,
    pub default_selected_items: Vec<T>,
    pub default_focused_item: Option<T>,
}

impl<T> XMultiSelectProps<T> {
    /// Fully uncontrolled, starting empty.
    pub fn new(base: MultiSelectProps<T>) -> Self {
        Self {
            base,
            selected_items: None,
            default_selected_items: Vec::new(),
            default_focused_item: None,
        }
    }

    pub fn controlled(mut self, selected_items: Vec<T>) -> Self {
        self.selected_items = Some(selected_items);
        self
    }

    pub fn default_selected_items(mut self, items: Vec<T>) -> Self {
        self.default_selected_items = items;
        self
    }

    pub fn default_focused_item(mut self, item: Option<T>) -> Self {
        self.default_focused_item = item;
        self
    }
}

struct LocalState<T> {
    selected_items: Vec<T>,
    focused_item: Option<T>,
}

pub struct XMultiSelect<T> {
    props: XMultiSelectProps<T>,
    local: Rc<RefCell<LocalState<T>>>,
    select: MultiSelect<T>,
}

impl<T: Clone + 'static> XMultiSelect<T> {
    pub fn new(props: XMultiSelectProps<T>) -> Self {
        let local = Rc::new(RefCell::new(LocalState {
            selected_items: props.default_selected_items.clone(),
            focused_item: props.default_focused_item.clone(),
        }));
        let select = MultiSelect::new(effective_props(&props, &local));
        Self { props, local, select }
    }

    /// New props from the owner. Uncontrolled state survives; defaults are
    /// only read on creation.
    pub fn set_props(&mut self, props: XMultiSelectProps<T>) {
        self.props = props;
        self.refresh();
    }

    pub fn is_selection_controlled(&self) -> bool {
        self.props.selected_items.is_some()
    }

    pub fn is_focus_controlled(&self) -> bool {
        self.props.base.on_focus_item.is_some()
    }

    pub fn selected_items(&self) -> Vec<T> {
        match &self.props.selected_items {
            Some(items) => items.clone(),
            None => self.local.borrow().selected_items.clone(),
        }
    }

    pub fn focused_item(&self) -> Option<T> {
        if self.is_focus_controlled() {
            self.props.base.focused_item.clone()
        } else {
            self.local.borrow().focused_item.clone()
        }
    }

    pub fn engine(&self) -> &MultiSelect<T> {
        &self.select
    }

    pub fn handle(&mut self, input: &SelectInput) -> SelectResult<EventResponse> {
        let response = self.select.handle(input);
        self.refresh();
        response
    }

    pub fn render(&self) -> SelectResult<MultiSelectView> {
        self.select.render()
    }

    fn refresh(&mut self) {
        self.select.set_props(effective_props(&self.props, &self.local));
    }
}

/// The props the engine sees: the caller's, with locally kept state and
/// the callbacks that update it spliced in.
fn effective_props<T: Clone + 'static>(
    props: &XMultiSelectProps<T>,
    local: &Rc<RefCell<LocalState<T>>>,
) -> MultiSelectProps<T> {
    let mut effective = props.base.clone();

    match &props.selected_items {
        Some(items) => effective.selected_items = items.clone(),
        None => {
            effective.selected_items = local.borrow().selected_items.clone();

            let state = local.clone();
            let on_select = props.base.on_select.clone();
            effective.on_select = Rc::new(move |item: &T| -> SelectResponse {
                state.borrow_mut().selected_items.push(item.clone());
                on_select(item)
            });

            let state = local.clone();
            let on_unselect = props.base.on_unselect.clone();
            let item_key = props.base.item_key.clone();
            effective.on_unselect = Rc::new(move |item: &T| {
                let key = item_key(item);
                state
                    .borrow_mut()
                    .selected_items
                    .retain(|other| item_key(other) != key);
                on_unselect(item);
            });

            if let Some(on_reorder) = props.base.on_reorder.clone() {
                let state = local.clone();
                effective.on_reorder = Some(Rc::new(move |from: usize, to: usize| {
                    {
                        let mut state = state.borrow_mut();
                        let items = &mut state.selected_items;
                        if from < items.len() && to < items.len() {
                            let item = items.remove(from);
                            items.insert(to, item);
                        }
                    }
                    on_reorder(from, to);
                }));
            }
        }
    }

    if props.base.on_focus_item.is_none() {
        effective.focused_item = local.borrow().focused_item.clone();
        let state = local.clone();
        effective.on_focus_item = Some(Rc::new(move |item: &T| {
            state.borrow_mut().focused_item = Some(item.clone());
        }));
    }

    effective
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn base() -> MultiSelectProps<&'static str> {
        MultiSelectProps::new(vec!["red", "green", "blue"])
    }

    #[test]
    fn uncontrolled_selection_is_kept_locally() {
        let mut select =
            XMultiSelect::new(XMultiSelectProps::new(base()).default_selected_items(vec!["blue"]));
        select.handle(&SelectInput::Focus).unwrap();
        select.handle(&SelectInput::OptionClicked(0)).unwrap();
        assert_eq!(select.selected_items(), vec!["blue", "red"]);
        assert_eq!(select.render().unwrap().pill_labels(), vec!["blue", "red"]);

        select.handle(&SelectInput::PillDeleteMouseDown(0)).unwrap();
        assert_eq!(select.selected_items(), vec!["red"]);
    }

    #[test]
    fn controlled_selection_only_reports() {
        let picked = Rc::new(RefCell::new(Vec::new()));
        let p = picked.clone();
        let props =
            XMultiSelectProps::new(base().on_select(move |item: &&str| p.borrow_mut().push(*item)))
                .controlled(vec!["green"]);
        let mut select = XMultiSelect::new(props);
        select.handle(&SelectInput::OptionClicked(0)).unwrap();
        assert_eq!(*picked.borrow(), vec!["red"]);
        assert_eq!(select.selected_items(), vec!["green"]);
        assert!(select.is_selection_controlled());
    }

    #[test]
    fn uncontrolled_focus_follows_pill_clicks() {
        let props = XMultiSelectProps::new(base().pills_focusable(true))
            .default_selected_items(vec!["red", "blue"])
            .default_focused_item(Some("red"));
        let mut select = XMultiSelect::new(props);
        assert!(!select.is_focus_controlled());
        assert!(select.render().unwrap().pills[0].selected);

        select.handle(&SelectInput::PillClicked(1)).unwrap();
        assert_eq!(select.focused_item(), Some("blue"));
        let pills = select.render().unwrap().pills;
        assert!(!pills[0].selected);
        assert!(pills[1].selected);
    }

    #[test]
    fn controlled_focus_uses_caller_handler() {
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let props = XMultiSelectProps::new(
            base()
                .pills_focusable(true)
                .focused_item(Some("red"))
                .on_focus_item(move |_| c.set(c.get() + 1)),
        )
        .default_selected_items(vec!["red", "blue"]);
        let mut select = XMultiSelect::new(props);
        select.handle(&SelectInput::PillClicked(1)).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(select.focused_item(), Some("red"));
    }

    #[test]
    fn uncontrolled_reorder_moves_local_selection() {
        let props = XMultiSelectProps::new(base().on_reorder(|_, _| {}))
            .default_selected_items(vec!["red", "green", "blue"]);
        let mut select = XMultiSelect::new(props);
        select.handle(&SelectInput::DragStart(0)).unwrap();
        select.handle(&SelectInput::DragOver(2)).unwrap();
        select.handle(&SelectInput::DragEnd).unwrap();
        assert_eq!(select.selected_items(), vec!["green", "blue", "red"]);
    }
}
