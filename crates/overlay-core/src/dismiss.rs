//! Closes an open overlay on outside interaction.
//!
//! Two states, `Open` and `Closed`; `Closed` is terminal for a controller.
//! While open it listens for:
//!
//! | Event | Where | Decision |
//! |-------|-------|----------|
//! | `keydown` Escape | document, bubble | close |
//! | `click` | document, **capture** | close on the next zero-delay tick |
//! | `wheel` | document, bubble | close unless the target is inside the menu |
//! | `frame-wheel` | window | close |
//! | `frame-pointerdown` | window | close |
//!
//! plus the dropdown's own "visible = false" signal via
//! [`DismissalController::visibility_changed`].
//!
//! The click path defers because the capture listener runs before the menu
//! item's own click handler; closing synchronously would tear the item down
//! before it fires.

use crate::config::OverlayConfig;
use crate::dom::{DomEvent, EventKind, Listener, ListenerTarget, NodeId, Phase, Platform};
use smallvec::SmallVec;
use std::cell::Cell;
use std::rc::{Rc, Weak};

/// The document/window subscriptions held while open.
pub const SUBSCRIPTIONS: [(ListenerTarget, EventKind, Phase); 5] = [
    (ListenerTarget::Document, EventKind::KeyDown, Phase::Bubble),
    (ListenerTarget::Document, EventKind::Click, Phase::Capture),
    (ListenerTarget::Document, EventKind::Wheel, Phase::Bubble),
    (ListenerTarget::Window, EventKind::FrameWheel, Phase::Bubble),
    (ListenerTarget::Window, EventKind::FramePointerDown, Phase::Bubble),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissState {
    Open,
    Closed,
}

/// What an event means for the open overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    Ignore,
    Close,
    /// Close after the current handler chain finishes.
    CloseDeferred,
}

/// Decide what `event` does to an open overlay.
///
/// `within_overlay` answers whether a node sits inside the menu's subtree.
pub fn classify(
    event: &DomEvent,
    escape_key_code: u32,
    within_overlay: impl Fn(NodeId) -> bool,
) -> Dismissal {
    match event.kind {
        EventKind::KeyDown => {
            let is_escape = event.key_code == Some(escape_key_code)
                || event.key.as_deref() == Some("Escape");
            if is_escape {
                Dismissal::Close
            } else {
                Dismissal::Ignore
            }
        }
        EventKind::Click => Dismissal::CloseDeferred,
        EventKind::Wheel => match event.target {
            Some(target) if within_overlay(target) => Dismissal::Ignore,
            _ => Dismissal::Close,
        },
        // No ancestor relationship exists across the frame boundary.
        EventKind::FrameWheel | EventKind::FramePointerDown => Dismissal::Close,
        EventKind::ContextMenu => Dismissal::Ignore,
    }
}

pub struct DismissalController {
    state: Rc<Cell<DismissState>>,
    escape_key_code: u32,
    overlay_class: String,
    platform: Option<Weak<dyn Platform>>,
    registered: SmallVec<[(ListenerTarget, EventKind, Phase, Listener); 5]>,
}

impl DismissalController {
    pub fn new(config: &OverlayConfig) -> Self {
        Self {
            state: Rc::new(Cell::new(DismissState::Open)),
            escape_key_code: config.escape_key_code,
            overlay_class: config.overlay_class.clone(),
            platform: None,
            registered: SmallVec::new(),
        }
    }

    pub fn state(&self) -> DismissState {
        self.state.get()
    }

    pub fn is_listening(&self) -> bool {
        !self.registered.is_empty()
    }

    /// Register the five listeners; each calls `on_close` when it decides
    /// to close. No-op if already started or closed.
    pub fn start(&mut self, platform: &Rc<dyn Platform>, on_close: Rc<dyn Fn()>) {
        if self.is_listening() || self.state.get() == DismissState::Closed {
            return;
        }
        self.platform = Some(Rc::downgrade(platform));
        for (target, kind, phase) in SUBSCRIPTIONS {
            let listener = self.listener(platform, on_close.clone());
            platform.add_listener(target, kind, phase, &listener);
            log::trace!("dismissal: listening for {} on {target:?}", kind.dom_name());
            self.registered.push((target, kind, phase, listener));
        }
    }

    /// Move to `Closed` and remove every listener `start` registered.
    pub fn stop(&mut self) {
        self.state.set(DismissState::Closed);
        let platform = self.platform.as_ref().and_then(Weak::upgrade);
        for (target, kind, phase, listener) in self.registered.drain(..) {
            if let Some(platform) = &platform {
                platform.remove_listener(target, kind, phase, &listener);
                log::trace!("dismissal: removed {} listener", kind.dom_name());
            }
        }
    }

    /// The dropdown reported a visibility change of its own.
    pub fn visibility_changed(&self, visible: bool) -> Dismissal {
        if !visible && self.state.get() == DismissState::Open {
            Dismissal::Close
        } else {
            Dismissal::Ignore
        }
    }

    fn listener(&self, platform: &Rc<dyn Platform>, on_close: Rc<dyn Fn()>) -> Listener {
        let state = self.state.clone();
        let platform = Rc::downgrade(platform);
        let escape = self.escape_key_code;
        let class = self.overlay_class.clone();
        Rc::new(move |event: &DomEvent| {
            if state.get() == DismissState::Closed {
                return;
            }
            let Some(platform) = platform.upgrade() else {
                return;
            };
            let decision = classify(event, escape, |node| {
                platform.has_ancestor_class(node, &class)
            });
            log::trace!("dismissal: {} -> {decision:?}", event.kind.dom_name());
            match decision {
                Dismissal::Ignore => {}
                Dismissal::Close => on_close(),
                Dismissal::CloseDeferred => {
                    let on_close = on_close.clone();
                    platform.defer(Box::new(move || on_close()));
                }
            }
        })
    }
}

impl Drop for DismissalController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessDocument;
    use std::cell::Cell;

    fn start(doc: &Rc<HeadlessDocument>) -> (DismissalController, Rc<Cell<u32>>) {
        let closes = Rc::new(Cell::new(0));
        let c = closes.clone();
        let platform: Rc<dyn Platform> = doc.clone();
        let mut controller = DismissalController::new(&OverlayConfig::default());
        controller.start(&platform, Rc::new(move || c.set(c.get() + 1)));
        (controller, closes)
    }

    #[test]
    fn classify_escape_by_code_or_key() {
        let never = |_: NodeId| false;
        assert_eq!(classify(&DomEvent::key_down("Escape", 27), 27, never), Dismissal::Close);
        assert_eq!(classify(&DomEvent::key_down("Esc", 27), 27, never), Dismissal::Close);
        assert_eq!(classify(&DomEvent::key_down("a", 65), 27, never), Dismissal::Ignore);
    }

    #[test]
    fn classify_wheel_inside_overlay_is_ignored() {
        let inside = DomEvent::wheel(Some(NodeId(7)));
        assert_eq!(classify(&inside, 27, |n| n == NodeId(7)), Dismissal::Ignore);
        assert_eq!(classify(&inside, 27, |_| false), Dismissal::Close);
        assert_eq!(classify(&DomEvent::wheel(None), 27, |_| true), Dismissal::Close);
    }

    #[test]
    fn classify_frame_events_always_close() {
        assert_eq!(classify(&DomEvent::frame_wheel(), 27, |_| true), Dismissal::Close);
        assert_eq!(
            classify(&DomEvent::frame_pointer_down(), 27, |_| true),
            Dismissal::Close
        );
    }

    #[test]
    fn start_registers_five_and_stop_removes_them() {
        let doc = HeadlessDocument::shared();
        let (mut controller, _) = start(&doc);
        assert_eq!(doc.listener_count(), 5);
        controller.stop();
        assert_eq!(doc.listener_count(), 0);
        assert_eq!(controller.state(), DismissState::Closed);
    }

    #[test]
    fn click_close_waits_for_the_next_tick() {
        let doc = HeadlessDocument::shared();
        let (_controller, closes) = start(&doc);
        doc.click_outside();
        assert_eq!(closes.get(), 0);
        assert_eq!(doc.pending_tasks(), 1);
        doc.run_pending();
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn frame_pointer_down_closes_immediately() {
        let doc = HeadlessDocument::shared();
        let (_controller, closes) = start(&doc);
        doc.frame_pointer_down();
        assert_eq!(closes.get(), 1);
        assert_eq!(doc.pending_tasks(), 0);
    }

    #[test]
    fn dropping_the_controller_unregisters() {
        let doc = HeadlessDocument::shared();
        {
            let _ = start(&doc);
        }
        assert_eq!(doc.listener_count(), 0);
        doc.key_down("Escape", 27);
    }

    #[test]
    fn visibility_false_closes_only_while_open() {
        let mut controller = DismissalController::new(&OverlayConfig::default());
        assert_eq!(controller.visibility_changed(true), Dismissal::Ignore);
        assert_eq!(controller.visibility_changed(false), Dismissal::Close);
        controller.stop();
        assert_eq!(controller.visibility_changed(false), Dismissal::Ignore);
    }
}
