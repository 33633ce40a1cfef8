//! `Platform` over the real browser DOM via `web-sys`.
//!
//! Every element this platform creates is tagged with a `data-overlay-node`
//! attribute carrying its `NodeId`, so native event targets can be mapped
//! back with `closest()`. Native closures are kept alive alongside the
//! listener they wrap and dropped one tick after removal: removal usually
//! happens from inside the very handler being removed.

use overlay_core::dom::{
    DomEvent, EventKind, Listener, ListenerTarget, NodeId, Phase, Platform, Task, View,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CustomEvent, Document, Element, Event, EventTarget, HtmlElement, KeyboardEvent, MouseEvent,
    Window,
};

const NODE_ATTR: &str = "data-overlay-node";

type NativeHandler = Closure<dyn FnMut(Event)>;

struct Registered {
    target: ListenerTarget,
    kind: EventKind,
    phase: Phase,
    listener: Listener,
    closure: NativeHandler,
}

impl Registered {
    fn matches(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
        listener: &Listener,
    ) -> bool {
        self.target == target
            && self.kind == kind
            && self.phase == phase
            && Rc::ptr_eq(&self.listener, listener)
    }
}

/// Elements and handlers rendered into one container.
#[derive(Default)]
struct Mounted {
    nodes: Vec<NodeId>,
    closures: Vec<NativeHandler>,
}

pub struct WebPlatform {
    window: Window,
    document: Document,
    body: HtmlElement,
    next_id: Cell<u32>,
    nodes: RefCell<BTreeMap<NodeId, Element>>,
    mounted: RefCell<BTreeMap<NodeId, Mounted>>,
    listeners: RefCell<Vec<Registered>>,
}

impl WebPlatform {
    pub fn new() -> Result<Self, String> {
        let window = web_sys::window().ok_or("no global window")?;
        let document = window.document().ok_or("window has no document")?;
        let body = document.body().ok_or("document has no body")?;
        Ok(Self {
            window,
            document,
            body,
            next_id: Cell::new(1),
            nodes: RefCell::new(BTreeMap::new()),
            mounted: RefCell::new(BTreeMap::new()),
            listeners: RefCell::new(Vec::new()),
        })
    }

    fn create_element(&self, tag: &str) -> Option<(NodeId, Element)> {
        let element = match self.document.create_element(tag) {
            Ok(element) => element,
            Err(err) => {
                log::error!("create_element({tag}) failed: {err:?}");
                return None;
            }
        };
        let id = NodeId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        element.set_attribute(NODE_ATTR, &id.0.to_string()).ok()?;
        self.nodes.borrow_mut().insert(id, element.clone());
        Some((id, element))
    }

    fn build(&self, view: &View, mounted: &mut Mounted) -> Option<Element> {
        let (id, element) = self.create_element(&view.tag)?;
        mounted.nodes.push(id);
        if !view.classes.is_empty() {
            element.set_class_name(&view.classes.join(" "));
        }
        let css = view.style.to_css();
        if !css.is_empty() {
            element.set_attribute("style", &css).ok()?;
        }
        if let Some(text) = &view.text {
            element.set_text_content(Some(text));
        }
        for (kind, listener) in &view.handlers {
            let closure = native_handler(*kind, listener.clone());
            let callback: &js_sys::Function = closure.as_ref().unchecked_ref();
            match element.add_event_listener_with_callback(kind.dom_name(), callback) {
                Ok(()) => mounted.closures.push(closure),
                Err(err) => log::warn!("{} handler not attached: {err:?}", kind.dom_name()),
            }
        }
        for child in &view.children {
            if let Some(child) = self.build(child, mounted) {
                element.append_child(&child).ok()?;
            }
        }
        Some(element)
    }

    fn event_target(&self, target: ListenerTarget) -> &EventTarget {
        match target {
            ListenerTarget::Document => &self.document,
            ListenerTarget::Window => &self.window,
        }
    }

    /// Drop native closures on the next tick; one of them may be running.
    fn retire(&self, closures: Vec<NativeHandler>) {
        if !closures.is_empty() {
            self.defer(Box::new(move || drop(closures)));
        }
    }
}

impl Platform for WebPlatform {
    fn create_container(&self, z_index: i32) -> NodeId {
        let Some((id, element)) = self.create_element("div") else {
            // Never allocated, so every later call on it is a no-op.
            return NodeId(0);
        };
        if let Err(err) = element
            .set_attribute("style", &format!("z-index: {z_index}"))
            .and_then(|()| self.body.append_child(&element).map(drop))
        {
            log::error!("overlay container not attached: {err:?}");
        }
        id
    }

    fn render(&self, container: NodeId, view: View) {
        let Some(host) = self.nodes.borrow().get(&container).cloned() else {
            log::warn!("render into unknown container {container:?}");
            return;
        };
        self.unmount(container);
        let mut mounted = Mounted::default();
        if let Some(root) = self.build(&view, &mut mounted)
            && let Err(err) = host.append_child(&root)
        {
            log::error!("overlay content not attached: {err:?}");
        }
        self.mounted.borrow_mut().insert(container, mounted);
    }

    fn unmount(&self, container: NodeId) -> bool {
        let Some(mounted) = self.mounted.borrow_mut().remove(&container) else {
            return false;
        };
        let host = {
            let mut nodes = self.nodes.borrow_mut();
            for id in &mounted.nodes {
                nodes.remove(id);
            }
            nodes.get(&container).cloned()
        };
        if let Some(host) = host {
            host.set_inner_html("");
        }
        self.retire(mounted.closures);
        true
    }

    fn remove_node(&self, node: NodeId) {
        let element = self.nodes.borrow_mut().remove(&node);
        if let Some(element) = element {
            element.remove();
        }
    }

    fn has_ancestor_class(&self, node: NodeId, class: &str) -> bool {
        let element = self.nodes.borrow().get(&node).cloned();
        element
            .and_then(|element| element.closest(&format!(".{class}")).ok().flatten())
            .is_some()
    }

    fn add_listener(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
        listener: &Listener,
    ) {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.iter().any(|r| r.matches(target, kind, phase, listener)) {
            return;
        }
        let closure = native_handler(kind, listener.clone());
        if let Err(err) = self.event_target(target).add_event_listener_with_callback_and_bool(
            kind.dom_name(),
            closure.as_ref().unchecked_ref(),
            phase.use_capture(),
        ) {
            log::warn!("{} listener not added: {err:?}", kind.dom_name());
            return;
        }
        listeners.push(Registered {
            target,
            kind,
            phase,
            listener: listener.clone(),
            closure,
        });
    }

    fn remove_listener(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
        listener: &Listener,
    ) {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            let Some(index) = listeners
                .iter()
                .position(|r| r.matches(target, kind, phase, listener))
            else {
                return;
            };
            listeners.remove(index)
        };
        if let Err(err) = self.event_target(target).remove_event_listener_with_callback_and_bool(
            kind.dom_name(),
            removed.closure.as_ref().unchecked_ref(),
            phase.use_capture(),
        ) {
            log::warn!("{} listener not removed: {err:?}", kind.dom_name());
        }
        self.retire(vec![removed.closure]);
    }

    fn defer(&self, task: Task) {
        let callback = Closure::once_into_js(move || task());
        if let Err(err) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), 0)
        {
            log::error!("setTimeout failed: {err:?}");
        }
    }
}

/// Wrap a platform-neutral listener as a native handler, forwarding
/// `prevent_default` / `stop_propagation` back to the native event.
fn native_handler(kind: EventKind, listener: Listener) -> NativeHandler {
    Closure::wrap(Box::new(move |event: Event| {
        let dom_event = translate(kind, &event);
        listener(&dom_event);
        if dom_event.default_prevented() {
            event.prevent_default();
        }
        if dom_event.propagation_stopped() {
            event.stop_propagation();
        }
    }) as Box<dyn FnMut(Event)>)
}

fn translate(kind: EventKind, event: &Event) -> DomEvent {
    let mut dom_event = DomEvent::new(kind);
    dom_event.target = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .and_then(|element| node_of(&element));
    if let Some(keyboard) = event.dyn_ref::<KeyboardEvent>() {
        dom_event.key = Some(keyboard.key());
        dom_event.key_code = Some(keyboard.key_code());
    }
    if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
        dom_event.page_x = f64::from(mouse.page_x());
        dom_event.page_y = f64::from(mouse.page_y());
        dom_event.button = mouse.button();
    }
    dom_event
}

/// The `NodeId` of `element` or of its nearest tagged ancestor.
fn node_of(element: &Element) -> Option<NodeId> {
    let owner = element.closest(&format!("[{NODE_ATTR}]")).ok()??;
    owner.get_attribute(NODE_ATTR)?.parse().ok().map(NodeId)
}

pub(crate) fn relay_on(window: &Window, kind: EventKind) -> Result<(), JsValue> {
    let event = CustomEvent::new(kind.dom_name())?;
    window.dispatch_event(&event)?;
    Ok(())
}
