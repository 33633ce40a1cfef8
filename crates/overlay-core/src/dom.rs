//! Platform abstraction over the browser DOM.
//!
//! Everything in this crate talks to the page through the [`Platform`]
//! trait: create a container on `document.body`, portal-render a [`View`]
//! into it, register document/window listeners, and schedule zero-delay
//! tasks. The browser implementation lives in `overlay-wasm`; the
//! [`HeadlessDocument`](crate::headless::HeadlessDocument) implements the
//! same trait in memory for tests.

use smallvec::SmallVec;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Opaque handle to an element owned by a platform.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ─── Events ──────────────────────────────────────────────────────────────

/// The DOM events the overlay layer listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyDown,
    Click,
    Wheel,
    ContextMenu,
    /// Wheel activity relayed out of the embedded preview frame.
    FrameWheel,
    /// Pointer-down relayed out of the embedded preview frame.
    FramePointerDown,
}

impl EventKind {
    /// The DOM event type string (`addEventListener` first argument).
    pub fn dom_name(self) -> &'static str {
        match self {
            EventKind::KeyDown => "keydown",
            EventKind::Click => "click",
            EventKind::Wheel => "wheel",
            EventKind::ContextMenu => "contextmenu",
            EventKind::FrameWheel => "frame-wheel",
            EventKind::FramePointerDown => "frame-pointerdown",
        }
    }

    pub fn from_dom_name(name: &str) -> Option<Self> {
        match name {
            "keydown" => Some(EventKind::KeyDown),
            "click" => Some(EventKind::Click),
            "wheel" => Some(EventKind::Wheel),
            "contextmenu" => Some(EventKind::ContextMenu),
            "frame-wheel" => Some(EventKind::FrameWheel),
            "frame-pointerdown" => Some(EventKind::FramePointerDown),
            _ => None,
        }
    }
}

/// Where a global listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    Document,
    Window,
}

/// DOM dispatch phase a listener is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Capture,
    Bubble,
}

impl Phase {
    /// The `useCapture` flag passed to `add/removeEventListener`.
    pub fn use_capture(self) -> bool {
        matches!(self, Phase::Capture)
    }
}

/// A platform-neutral DOM event.
///
/// `prevent_default` / `stop_propagation` only flip flags; the platform
/// forwards them to the native event (or honors them during headless
/// dispatch).
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub kind: EventKind,
    /// Innermost known element the event was dispatched to.
    pub target: Option<NodeId>,
    /// `KeyboardEvent.key`.
    pub key: Option<String>,
    /// `KeyboardEvent.keyCode`.
    pub key_code: Option<u32>,
    pub page_x: f64,
    pub page_y: f64,
    /// `MouseEvent.button` (0 = primary, 2 = secondary).
    pub button: i16,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl DomEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            target: None,
            key: None,
            key_code: None,
            page_x: 0.0,
            page_y: 0.0,
            button: 0,
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn key_down(key: &str, key_code: u32) -> Self {
        let mut event = Self::new(EventKind::KeyDown);
        event.key = Some(key.to_string());
        event.key_code = Some(key_code);
        event
    }

    pub fn click(target: Option<NodeId>) -> Self {
        Self::new(EventKind::Click).with_target(target)
    }

    pub fn context_menu(target: Option<NodeId>, page_x: f64, page_y: f64) -> Self {
        let mut event = Self::new(EventKind::ContextMenu).with_target(target);
        event.page_x = page_x;
        event.page_y = page_y;
        event.button = 2;
        event
    }

    pub fn wheel(target: Option<NodeId>) -> Self {
        Self::new(EventKind::Wheel).with_target(target)
    }

    pub fn frame_wheel() -> Self {
        Self::new(EventKind::FrameWheel)
    }

    pub fn frame_pointer_down() -> Self {
        Self::new(EventKind::FramePointerDown)
    }

    pub fn with_target(mut self, target: Option<NodeId>) -> Self {
        self.target = target;
        self
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

/// An event callback. Identity is `Rc` pointer identity, so the same
/// `Listener` must be passed to `add_listener` and `remove_listener`.
pub type Listener = Rc<dyn Fn(&DomEvent)>;

/// A deferred unit of work for [`Platform::defer`].
pub type Task = Box<dyn FnOnce()>;

// ─── View tree ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Absolute,
    Fixed,
    Relative,
}

/// The inline style subset overlays need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub position: Option<Position>,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub z_index: Option<i32>,
}

impl Style {
    /// Render as a CSS declaration list (`left: 10px; ...`).
    pub fn to_css(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(position) = self.position {
            let value = match position {
                Position::Absolute => "absolute",
                Position::Fixed => "fixed",
                Position::Relative => "relative",
            };
            parts.push(format!("position: {value}"));
        }
        if let Some(left) = self.left {
            parts.push(format!("left: {left}px"));
        }
        if let Some(top) = self.top {
            parts.push(format!("top: {top}px"));
        }
        if let Some(width) = self.width {
            parts.push(format!("width: {width}px"));
        }
        if let Some(height) = self.height {
            parts.push(format!("height: {height}px"));
        }
        if let Some(z) = self.z_index {
            parts.push(format!("z-index: {z}"));
        }
        parts.join("; ")
    }
}

/// A declarative element tree that a platform can portal-render.
#[derive(Clone, Default)]
pub struct View {
    pub tag: String,
    pub classes: Vec<String>,
    pub style: Style,
    pub text: Option<String>,
    pub handlers: SmallVec<[(EventKind, Listener); 2]>,
    pub children: Vec<View>,
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<EventKind> = self.handlers.iter().map(|(kind, _)| *kind).collect();
        f.debug_struct("View")
            .field("tag", &self.tag)
            .field("classes", &self.classes)
            .field("style", &self.style)
            .field("text", &self.text)
            .field("handlers", &kinds)
            .field("children", &self.children)
            .finish()
    }
}

impl View {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.extend(class.split_whitespace().map(String::from));
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn on(mut self, kind: EventKind, listener: Listener) -> Self {
        self.handlers.push((kind, listener));
        self
    }

    pub fn child(mut self, child: View) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

// ─── Platform ────────────────────────────────────────────────────────────

/// The page the overlays live in.
///
/// All methods take `&self`: platforms are shared behind `Rc` and mutate
/// through interior mutability, the same way a browser document is shared.
pub trait Platform {
    /// Create a `<div>` with the given z-index and append it to the body.
    fn create_container(&self, z_index: i32) -> NodeId;

    /// Portal-render `view` as the sole content of `container`.
    fn render(&self, container: NodeId, view: View);

    /// Tear down the content rendered into `container`.
    /// Returns `true` iff something was actually unmounted.
    fn unmount(&self, container: NodeId) -> bool;

    /// Detach `node` from its parent and drop it.
    fn remove_node(&self, node: NodeId);

    /// Whether `node` or one of its ancestors carries `class`.
    fn has_ancestor_class(&self, node: NodeId, class: &str) -> bool;

    fn add_listener(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
        listener: &Listener,
    );

    fn remove_listener(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
        listener: &Listener,
    );

    /// Run `task` after the current event's handler chain (`setTimeout(.., 0)`).
    fn defer(&self, task: Task);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_roundtrip() {
        for kind in [
            EventKind::KeyDown,
            EventKind::Click,
            EventKind::Wheel,
            EventKind::ContextMenu,
            EventKind::FrameWheel,
            EventKind::FramePointerDown,
        ] {
            assert_eq!(EventKind::from_dom_name(kind.dom_name()), Some(kind));
        }
        assert_eq!(EventKind::from_dom_name("mousemove"), None);
    }

    #[test]
    fn prevent_default_sets_flag() {
        let event = DomEvent::context_menu(None, 10.0, 20.0);
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.default_prevented());
        assert_eq!(event.button, 2);
    }

    #[test]
    fn style_to_css() {
        let style = Style {
            position: Some(Position::Absolute),
            left: Some(12.0),
            top: Some(40.5),
            width: Some(0.0),
            height: Some(0.0),
            z_index: None,
        };
        assert_eq!(
            style.to_css(),
            "position: absolute; left: 12px; top: 40.5px; width: 0px; height: 0px"
        );
    }

    #[test]
    fn view_class_splits_whitespace() {
        let view = View::new("div").class("ant-dropdown context-menu-overlay");
        assert!(view.has_class("ant-dropdown"));
        assert!(view.has_class("context-menu-overlay"));
        assert!(!view.has_class("ant"));
    }
}
