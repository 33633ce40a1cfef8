//! Imperative entry points for call sites that cannot use the wrapper.

use crate::anchor::PagePoint;
use crate::dom::{DomEvent, Listener};
use crate::host::{OverlayHandle, OverlayHost};
use crate::menu::MenuDescriptor;
use std::rc::Rc;

/// Optional replacement for the event's page coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnchorOverride {
    pub page_x: Option<f64>,
    pub page_y: Option<f64>,
}

/// Open `menu` at the event's page position (or the override).
///
/// Returns `None` without side effects when no menu is given or another
/// menu already holds the gate. The caller owns the returned handle and
/// must `destroy` it if its own UI goes away first.
pub fn open_context_menu_at(
    host: &OverlayHost,
    event: &DomEvent,
    menu: Option<&MenuDescriptor>,
    at: AnchorOverride,
) -> Option<OverlayHandle> {
    let menu = menu?;
    if !host.gate().try_acquire() {
        return None;
    }
    let point = PagePoint::new(
        at.page_x.unwrap_or(event.page_x),
        at.page_y.unwrap_or(event.page_y),
    );
    Some(host.open(menu, point))
}

/// Suppress the native context menu and open `menu` at the pointer.
pub fn maybe_show_context_menu(
    host: &OverlayHost,
    event: &DomEvent,
    menu: &MenuDescriptor,
) -> Option<OverlayHandle> {
    event.prevent_default();
    open_context_menu_at(host, event, Some(menu), AnchorOverride::default())
}

/// A `contextmenu` handler that opens `menu`; attach it to any element.
pub fn use_context_menu(host: &OverlayHost, menu: MenuDescriptor) -> Listener {
    let host = host.clone();
    Rc::new(move |event: &DomEvent| {
        maybe_show_context_menu(&host, event, &menu);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{EventKind, View};
    use crate::gate::GlobalMenuGate;
    use crate::headless::HeadlessDocument;
    use crate::menu::{Menu, MenuItem};
    use pretty_assertions::assert_eq;

    fn setup() -> (Rc<HeadlessDocument>, OverlayHost) {
        let doc = HeadlessDocument::shared();
        let host = OverlayHost::with_gate(doc.clone(), Rc::new(GlobalMenuGate::new()));
        (doc, host)
    }

    fn menu() -> MenuDescriptor {
        Menu::new().item(MenuItem::action("rename", "Rename")).into()
    }

    #[test]
    fn missing_menu_returns_none_and_keeps_gate_free() {
        let (doc, host) = setup();
        let event = DomEvent::context_menu(None, 1.0, 1.0);
        assert!(open_context_menu_at(&host, &event, None, AnchorOverride::default()).is_none());
        assert!(!host.gate().is_held());
        assert!(doc.body_children().is_empty());
    }

    #[test]
    fn override_replaces_event_coordinates() {
        let (doc, host) = setup();
        let event = DomEvent::context_menu(None, 10.0, 20.0);
        let handle = open_context_menu_at(
            &host,
            &event,
            Some(&menu()),
            AnchorOverride {
                page_x: Some(300.0),
                page_y: None,
            },
        )
        .unwrap();
        let anchor = doc.children_of(handle.container())[0];
        let style = doc.style_of(anchor).unwrap();
        assert_eq!((style.left, style.top), (Some(300.0), Some(20.0)));
    }

    #[test]
    fn nested_handlers_open_one_menu() {
        let (doc, host) = setup();
        let outer = use_context_menu(&host, menu());
        let inner = use_context_menu(&host, menu());
        let row = doc.append_view(
            doc.body(),
            View::new("div")
                .on(EventKind::ContextMenu, outer)
                .child(View::new("span").text("cell").on(EventKind::ContextMenu, inner)),
        );
        let cell = doc.children_of(row)[0];

        let event = doc.context_menu(cell, 40.0, 50.0);
        assert!(event.default_prevented());
        assert_eq!(doc.find_by_class("context-menu-overlay").len(), 1);
    }
}
