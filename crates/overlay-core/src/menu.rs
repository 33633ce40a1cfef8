//! Menu model: items, click routing, and the lazily-built descriptor.
//!
//! A [`Menu`] is plain data plus handlers. Selecting an item runs the item's
//! own handler first and the menu-level handler second, matching the
//! dropdown menu the studio renders.

use crate::dom::{DomEvent, EventKind, Listener, View};
use std::fmt;
use std::rc::Rc;

/// Handler invoked when a menu item is selected.
pub type ClickHandler = Rc<dyn Fn(&MenuClick)>;

/// What was selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuClick {
    pub key: String,
    /// Keys from the selected item up to the top level (leaf first).
    pub key_path: Vec<String>,
}

// ─── MenuItem ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum MenuItem {
    /// A clickable entry.
    Action {
        key: String,
        label: String,
        disabled: bool,
        on_click: Option<ClickHandler>,
    },
    Divider,
    /// A nested group of entries.
    SubMenu {
        key: String,
        label: String,
        items: Vec<MenuItem>,
    },
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::Action {
                key,
                label,
                disabled,
                on_click,
            } => f
                .debug_struct("Action")
                .field("key", key)
                .field("label", label)
                .field("disabled", disabled)
                .field("on_click", &on_click.is_some())
                .finish(),
            MenuItem::Divider => f.write_str("Divider"),
            MenuItem::SubMenu { key, label, items } => f
                .debug_struct("SubMenu")
                .field("key", key)
                .field("label", label)
                .field("items", items)
                .finish(),
        }
    }
}

impl MenuItem {
    pub fn action(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Action {
            key: key.into(),
            label: label.into(),
            disabled: false,
            on_click: None,
        }
    }

    pub fn divider() -> Self {
        Self::Divider
    }

    pub fn submenu(key: impl Into<String>, label: impl Into<String>, items: Vec<MenuItem>) -> Self {
        Self::SubMenu {
            key: key.into(),
            label: label.into(),
            items,
        }
    }

    /// Builder: attach a click handler (actions only).
    pub fn on_click(mut self, handler: impl Fn(&MenuClick) + 'static) -> Self {
        if let Self::Action { on_click, .. } = &mut self {
            *on_click = Some(Rc::new(handler));
        }
        self
    }

    /// Builder: set the disabled state (actions only).
    pub fn disabled(mut self, value: bool) -> Self {
        if let Self::Action { disabled, .. } = &mut self {
            *disabled = value;
        }
        self
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Action { key, .. } | Self::SubMenu { key, .. } => Some(key),
            Self::Divider => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Action { label, .. } | Self::SubMenu { label, .. } => Some(label),
            Self::Divider => None,
        }
    }
}

// ─── Menu ────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Menu {
    pub items: Vec<MenuItem>,
    pub on_click: Option<ClickHandler>,
    pub class_name: Option<String>,
}

impl fmt::Debug for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Menu")
            .field("items", &self.items)
            .field("on_click", &self.on_click.is_some())
            .field("class_name", &self.class_name)
            .finish()
    }
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(mut self, item: MenuItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn on_click(mut self, handler: impl Fn(&MenuClick) + 'static) -> Self {
        self.on_click = Some(Rc::new(handler));
        self
    }

    pub fn class_name(mut self, class: impl Into<String>) -> Self {
        self.class_name = Some(class.into());
        self
    }

    /// Locate the action with `key`, returning it with its key path.
    pub fn find_action(&self, key: &str) -> Option<(&MenuItem, Vec<String>)> {
        find_in(&self.items, key)
    }

    /// Select the action with `key`: item handler, then menu handler.
    /// Returns `None` (running nothing) for unknown or disabled keys.
    pub fn activate(&self, key: &str) -> Option<MenuClick> {
        let (item, key_path) = self.find_action(key)?;
        let MenuItem::Action {
            disabled, on_click, ..
        } = item
        else {
            return None;
        };
        if *disabled {
            return None;
        }
        let click = MenuClick {
            key: key.to_string(),
            key_path,
        };
        if let Some(handler) = on_click {
            handler(&click);
        }
        if let Some(handler) = &self.on_click {
            handler(&click);
        }
        Some(click)
    }

    /// Build the element tree. Every enabled action activates on click and
    /// then calls `after_select`.
    pub fn render(&self, after_select: Option<ClickHandler>) -> View {
        let menu = Rc::new(self.clone());
        let mut root = View::new("ul").class("ant-dropdown-menu");
        if let Some(class) = &self.class_name {
            root = root.class(class);
        }
        for item in &self.items {
            root = root.child(render_item(item, &menu, &after_select));
        }
        root
    }
}

fn find_in<'a>(items: &'a [MenuItem], key: &str) -> Option<(&'a MenuItem, Vec<String>)> {
    for item in items {
        match item {
            MenuItem::Action { key: k, .. } if k == key => {
                return Some((item, vec![k.clone()]));
            }
            MenuItem::SubMenu { key: parent, items, .. } => {
                if let Some((found, mut path)) = find_in(items, key) {
                    path.push(parent.clone());
                    return Some((found, path));
                }
            }
            _ => {}
        }
    }
    None
}

fn render_item(item: &MenuItem, menu: &Rc<Menu>, after_select: &Option<ClickHandler>) -> View {
    match item {
        MenuItem::Action {
            key,
            label,
            disabled,
            ..
        } => {
            let view = View::new("li").class("ant-dropdown-menu-item").text(label);
            if *disabled {
                return view.class("ant-dropdown-menu-item-disabled");
            }
            let menu = menu.clone();
            let key = key.clone();
            let after_select = after_select.clone();
            let handler: Listener = Rc::new(move |_: &DomEvent| {
                if let Some(click) = menu.activate(&key)
                    && let Some(after) = &after_select
                {
                    after(&click);
                }
            });
            view.on(EventKind::Click, handler)
        }
        MenuItem::Divider => View::new("li").class("ant-dropdown-menu-item-divider"),
        MenuItem::SubMenu { label, items, .. } => {
            let mut sub = View::new("ul").class("ant-dropdown-menu-sub");
            for child in items {
                sub = sub.child(render_item(child, menu, after_select));
            }
            View::new("li")
                .class("ant-dropdown-menu-submenu")
                .child(
                    View::new("div")
                        .class("ant-dropdown-menu-submenu-title")
                        .text(label),
                )
                .child(sub)
        }
    }
}

// ─── MenuDescriptor ──────────────────────────────────────────────────────

/// A menu, either ready-made or built on demand each time it opens.
#[derive(Clone)]
pub enum MenuDescriptor {
    Static(Menu),
    Lazy(Rc<dyn Fn() -> Menu>),
}

impl fmt::Debug for MenuDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuDescriptor::Static(menu) => f.debug_tuple("Static").field(menu).finish(),
            MenuDescriptor::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl MenuDescriptor {
    pub fn lazy(build: impl Fn() -> Menu + 'static) -> Self {
        Self::Lazy(Rc::new(build))
    }

    /// Produce the menu for one open. A panicking builder is not caught.
    pub fn resolve(&self) -> Menu {
        match self {
            MenuDescriptor::Static(menu) => menu.clone(),
            MenuDescriptor::Lazy(build) => build(),
        }
    }
}

impl From<Menu> for MenuDescriptor {
    fn from(menu: Menu) -> Self {
        MenuDescriptor::Static(menu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};

    #[test]
    fn activate_runs_item_then_menu_handler() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (l1, l2) = (log.clone(), log.clone());
        let menu = Menu::new()
            .item(MenuItem::action("delete", "Delete").on_click(move |c| {
                l1.borrow_mut().push(format!("item:{}", c.key))
            }))
            .on_click(move |c| l2.borrow_mut().push(format!("menu:{}", c.key)));

        let click = menu.activate("delete").unwrap();
        assert_eq!(click.key_path, vec!["delete".to_string()]);
        assert_eq!(
            *log.borrow(),
            vec!["item:delete".to_string(), "menu:delete".to_string()]
        );
    }

    #[test]
    fn disabled_and_unknown_keys_do_nothing() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let menu = Menu::new()
            .item(MenuItem::action("a", "A").disabled(true))
            .on_click(move |_| h.set(h.get() + 1));
        assert!(menu.activate("a").is_none());
        assert!(menu.activate("missing").is_none());
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn submenu_key_path_is_leaf_first() {
        let menu = Menu::new().item(MenuItem::submenu(
            "arrange",
            "Arrange",
            vec![MenuItem::action("front", "Bring to front")],
        ));
        let click = menu.activate("front").unwrap();
        assert_eq!(
            click.key_path,
            vec!["front".to_string(), "arrange".to_string()]
        );
    }

    #[test]
    fn render_marks_disabled_items_without_handlers() {
        let menu = Menu::new()
            .item(MenuItem::action("copy", "Copy"))
            .item(MenuItem::divider())
            .item(MenuItem::action("paste", "Paste").disabled(true));
        let view = menu.render(None);
        assert_eq!(view.children.len(), 3);
        assert_eq!(view.children[0].handlers.len(), 1);
        assert!(view.children[1].has_class("ant-dropdown-menu-item-divider"));
        assert!(view.children[2].has_class("ant-dropdown-menu-item-disabled"));
        assert!(view.children[2].handlers.is_empty());
    }

    #[test]
    fn lazy_descriptor_rebuilds_each_resolve() {
        let builds = Rc::new(Cell::new(0));
        let b = builds.clone();
        let descriptor = MenuDescriptor::lazy(move || {
            b.set(b.get() + 1);
            Menu::new().item(MenuItem::action("x", "X"))
        });
        descriptor.resolve();
        descriptor.resolve();
        assert_eq!(builds.get(), 2);
    }
}
