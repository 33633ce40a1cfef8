//! Declarative context menu bound to the lifetime of its owner.
//!
//! `WithContextMenu` wraps a child view, opens its menu on right-click and
//! closes it when an item is selected. The open menu lives exactly as long
//! as the wrapper: `unmount` (or dropping the wrapper) tears it down, so the
//! owner never has to remember a `destroy` call.

use crate::anchor::PagePoint;
use crate::dom::{DomEvent, EventKind, Listener, Style, View};
use crate::host::{OverlayHandle, OverlayHost};
use crate::menu::{ClickHandler, MenuClick, MenuDescriptor};
use std::cell::RefCell;
use std::rc::Rc;

type OpenSlot = Rc<RefCell<Option<OverlayHandle>>>;

pub struct WithContextMenu {
    host: OverlayHost,
    overlay: Option<MenuDescriptor>,
    tag: String,
    class_name: Option<String>,
    style: Style,
    open: OpenSlot,
}

impl WithContextMenu {
    pub fn new(host: &OverlayHost) -> Self {
        Self {
            host: host.clone(),
            overlay: None,
            tag: "div".to_string(),
            class_name: None,
            style: Style::default(),
            open: Rc::new(RefCell::new(None)),
        }
    }

    pub fn overlay(mut self, overlay: impl Into<MenuDescriptor>) -> Self {
        self.overlay = Some(overlay.into());
        self
    }

    /// Tag of the wrapping element (`div` by default).
    pub fn as_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    pub fn class_name(mut self, class: &str) -> Self {
        self.class_name = Some(class.to_string());
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn is_open(&self) -> bool {
        self.open
            .borrow()
            .as_ref()
            .is_some_and(|handle| !handle.is_destroyed())
    }

    /// Wrap `children`. Without an overlay the children come back untouched.
    pub fn render(&self, children: View) -> View {
        let Some(overlay) = &self.overlay else {
            return children;
        };
        let mut view = View::new(&self.tag).style(self.style.clone());
        if let Some(class) = &self.class_name {
            view = view.class(class);
        }
        let host = self.host.clone();
        let overlay = overlay.clone();
        let slot = self.open.clone();
        let handler: Listener = Rc::new(move |event: &DomEvent| {
            open_from_event(&host, &overlay, &slot, event);
        });
        view.on(EventKind::ContextMenu, handler).child(children)
    }

    /// Handle a right-click on the wrapped element.
    pub fn on_context_menu(&self, event: &DomEvent) {
        if let Some(overlay) = &self.overlay {
            open_from_event(&self.host, overlay, &self.open, event);
        }
    }

    /// Close the menu if it is open.
    pub fn close(&self) {
        close_slot(&self.open);
    }

    /// The owner is going away.
    pub fn unmount(self) {}
}

impl Drop for WithContextMenu {
    fn drop(&mut self) {
        close_slot(&self.open);
    }
}

fn open_from_event(
    host: &OverlayHost,
    overlay: &MenuDescriptor,
    slot: &OpenSlot,
    event: &DomEvent,
) {
    event.prevent_default();
    // A live handle in the slot is the gate holder; replace it at the new point.
    close_slot(slot);
    if !host.gate().try_acquire() {
        return;
    }
    let weak_slot = Rc::downgrade(slot);
    let close_after_select: ClickHandler = Rc::new(move |_: &MenuClick| {
        if let Some(slot) = weak_slot.upgrade() {
            close_slot(&slot);
        }
    });
    let handle = host.open_with_after_select(
        overlay,
        PagePoint::new(event.page_x, event.page_y),
        close_after_select,
    );
    *slot.borrow_mut() = Some(handle);
}

fn close_slot(slot: &OpenSlot) {
    let handle = slot.borrow_mut().take();
    if let Some(handle) = handle {
        handle.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GlobalMenuGate;
    use crate::headless::HeadlessDocument;
    use crate::menu::{Menu, MenuItem};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn setup() -> (Rc<HeadlessDocument>, OverlayHost) {
        let doc = HeadlessDocument::shared();
        let host = OverlayHost::with_gate(doc.clone(), Rc::new(GlobalMenuGate::new()));
        (doc, host)
    }

    #[test]
    fn without_overlay_children_pass_through() {
        let (_doc, host) = setup();
        let wrapper = WithContextMenu::new(&host);
        let view = wrapper.render(View::new("span").text("row"));
        assert_eq!(view.tag, "span");
        assert!(view.handlers.is_empty());
    }

    #[test]
    fn wrapper_uses_custom_tag_and_class() {
        let (_doc, host) = setup();
        let wrapper = WithContextMenu::new(&host)
            .overlay(Menu::new())
            .as_tag("li")
            .class_name("dep-row");
        let view = wrapper.render(View::new("span"));
        assert_eq!(view.tag, "li");
        assert!(view.has_class("dep-row"));
        assert_eq!(view.handlers[0].0, EventKind::ContextMenu);
    }

    #[test]
    fn selecting_an_item_runs_action_then_closes() {
        let (doc, host) = setup();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let wrapper = WithContextMenu::new(&host).overlay(
            Menu::new().item(
                MenuItem::action("dup", "Duplicate").on_click(move |_| h.set(h.get() + 1)),
            ),
        );
        let row = doc.append_view(doc.body(), wrapper.render(View::new("span").text("row")));

        doc.context_menu(row, 3.0, 4.0);
        assert!(wrapper.is_open());

        let item = doc.find_by_text("Duplicate").unwrap();
        doc.click(item);
        assert_eq!(hits.get(), 1);
        assert!(!wrapper.is_open());
        assert!(!host.gate().is_held());
        doc.run_pending();
        assert_eq!(doc.body_children(), vec![row]);
    }

    #[test]
    fn unmount_tears_down_open_menu() {
        let (doc, host) = setup();
        let wrapper =
            WithContextMenu::new(&host).overlay(Menu::new().item(MenuItem::action("a", "A")));
        wrapper.on_context_menu(&DomEvent::context_menu(None, 0.0, 0.0));
        assert_eq!(doc.find_by_class("context-menu-overlay").len(), 1);

        wrapper.unmount();
        assert!(doc.find_by_class("context-menu-overlay").is_empty());
        assert_eq!(doc.listener_count(), 0);
        assert!(!host.gate().is_held());
    }
}
