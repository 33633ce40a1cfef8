//! In-memory document implementing [`Platform`].
//!
//! Mirrors the parts of the DOM the overlay layer depends on: a node tree
//! rooted at `body`, capture/bubble dispatch across window, document and
//! the target's ancestor chain, and a FIFO queue standing in for
//! zero-delay timers. Tests drive it with the `click` / `wheel` / ...
//! helpers and then call [`HeadlessDocument::run_pending`] to let deferred
//! work fire.

use crate::dom::{
    DomEvent, EventKind, Listener, ListenerTarget, NodeId, Phase, Platform, Style, Task, View,
};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

struct NodeData {
    tag: String,
    classes: Vec<String>,
    style: Style,
    text: Option<String>,
    handlers: SmallVec<[(EventKind, Listener); 2]>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            classes: Vec::new(),
            style: Style::default(),
            text: None,
            handlers: SmallVec::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

struct Registration {
    target: ListenerTarget,
    kind: EventKind,
    phase: Phase,
    listener: Listener,
}

impl Registration {
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

struct DocState {
    nodes: BTreeMap<NodeId, NodeData>,
    next_id: u32,
    body: NodeId,
    listeners: Vec<Registration>,
    /// Containers that currently hold rendered content.
    mounted: BTreeSet<NodeId>,
}

impl DocState {
    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, data);
        id
    }

    fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn detach(&mut self, node: NodeId) {
        let parent = self.nodes.get_mut(&node).and_then(|n| n.parent.take());
        if let Some(parent) = parent
            && let Some(p) = self.nodes.get_mut(&parent)
        {
            p.children.retain(|c| *c != node);
        }
    }

    fn insert_view(&mut self, parent: NodeId, view: View) -> NodeId {
        let View {
            tag,
            classes,
            style,
            text,
            handlers,
            children,
        } = view;
        let id = self.alloc(NodeData {
            tag,
            classes,
            style,
            text,
            handlers,
            parent: None,
            children: Vec::new(),
        });
        self.append(parent, id);
        for child in children {
            self.insert_view(id, child);
        }
        id
    }

    fn remove_subtree(&mut self, node: NodeId) {
        self.detach(node);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(data) = self.nodes.remove(&id) {
                stack.extend(data.children);
            }
            self.mounted.remove(&id);
        }
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = self
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove_subtree(child);
        }
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }
}

/// A headless stand-in for the browser page.
pub struct HeadlessDocument {
    state: RefCell<DocState>,
    tasks: RefCell<VecDeque<Task>>,
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDocument {
    pub fn new() -> Self {
        let mut state = DocState {
            nodes: BTreeMap::new(),
            next_id: 0,
            body: NodeId(0),
            listeners: Vec::new(),
            mounted: BTreeSet::new(),
        };
        state.body = state.alloc(NodeData::element("body"));
        Self {
            state: RefCell::new(state),
            tasks: RefCell::new(VecDeque::new()),
        }
    }

    /// Create a shared document, ready to hand to an `OverlayHost`.
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    pub fn body(&self) -> NodeId {
        self.state.borrow().body
    }

    /// Render `view` and append it under `parent`.
    pub fn append_view(&self, parent: NodeId, view: View) -> NodeId {
        self.state.borrow_mut().insert_view(parent, view)
    }

    pub fn body_children(&self) -> Vec<NodeId> {
        let state = self.state.borrow();
        state
            .nodes
            .get(&state.body)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.state.borrow().nodes.contains_key(&node)
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.state.borrow().is_attached(node)
    }

    /// First attached node (in creation order) whose text equals `text`.
    pub fn find_by_text(&self, text: &str) -> Option<NodeId> {
        let state = self.state.borrow();
        state
            .nodes
            .iter()
            .filter(|(_, n)| n.text.as_deref() == Some(text))
            .map(|(id, _)| *id)
            .find(|id| state.is_attached(*id))
    }

    /// All attached nodes carrying `class`, in creation order.
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        let state = self.state.borrow();
        state
            .nodes
            .iter()
            .filter(|(_, n)| n.classes.iter().any(|c| c == class))
            .map(|(id, _)| *id)
            .filter(|id| state.is_attached(*id))
            .collect()
    }

    pub fn tag_of(&self, node: NodeId) -> Option<String> {
        self.state.borrow().nodes.get(&node).map(|n| n.tag.clone())
    }

    pub fn style_of(&self, node: NodeId) -> Option<Style> {
        self.state.borrow().nodes.get(&node).map(|n| n.style.clone())
    }

    pub fn classes_of(&self, node: NodeId) -> Vec<String> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }

    pub fn text_of(&self, node: NodeId) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.text.clone())
    }

    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    /// Number of registered document/window listeners.
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Drain the zero-delay task queue, including tasks queued by tasks.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    // ─── Dispatch ────────────────────────────────────────────────────────

    /// Dispatch `event` the way the browser would.
    ///
    /// Frame events are dispatched on the window only. Everything else
    /// runs window capture, document capture, the node handlers from the
    /// target up to the root, then document and window bubble.
    pub fn dispatch(&self, event: &DomEvent) {
        let kind = event.kind;
        if matches!(kind, EventKind::FrameWheel | EventKind::FramePointerDown) {
            for phase in [Phase::Capture, Phase::Bubble] {
                self.invoke_global(ListenerTarget::Window, phase, event);
                if event.propagation_stopped() {
                    return;
                }
            }
            return;
        }

        for target in [ListenerTarget::Window, ListenerTarget::Document] {
            self.invoke_global(target, Phase::Capture, event);
            if event.propagation_stopped() {
                return;
            }
        }

        for handlers in self.handler_path(event.target, kind) {
            for handler in handlers {
                handler(event);
            }
            if event.propagation_stopped() {
                return;
            }
        }

        for target in [ListenerTarget::Document, ListenerTarget::Window] {
            self.invoke_global(target, Phase::Bubble, event);
            if event.propagation_stopped() {
                return;
            }
        }
    }

    /// Node handlers for `kind`, from the target up through its ancestors.
    /// Computed once up front, as the DOM fixes the propagation path
    /// before dispatch starts.
    fn handler_path(&self, target: Option<NodeId>, kind: EventKind) -> Vec<Vec<Listener>> {
        let state = self.state.borrow();
        let mut path = Vec::new();
        let mut current = target;
        while let Some(id) = current {
            let Some(node) = state.nodes.get(&id) else {
                break;
            };
            let handlers: Vec<Listener> = node
                .handlers
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, h)| h.clone())
                .collect();
            if !handlers.is_empty() {
                path.push(handlers);
            }
            current = node.parent;
        }
        path
    }

    fn invoke_global(&self, target: ListenerTarget, phase: Phase, event: &DomEvent) {
        let snapshot: Vec<Listener> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|r| r.target == target && r.kind == event.kind && r.phase == phase)
            .map(|r| r.listener.clone())
            .collect();
        for listener in snapshot {
            // Removed by an earlier listener in this same dispatch.
            if !self.is_registered(target, event.kind, phase, &listener) {
                continue;
            }
            listener(event);
        }
    }

    fn is_registered(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
        listener: &Listener,
    ) -> bool {
        self.state
            .borrow()
            .listeners
            .iter()
            .any(|r| r.matches(target, kind, phase, listener))
    }

    // ─── Helpers ─────────────────────────────────────────────────────────

    pub fn click(&self, node: NodeId) -> DomEvent {
        let event = DomEvent::click(Some(node));
        self.dispatch(&event);
        event
    }

    /// Click on the page background (no element of interest).
    pub fn click_outside(&self) -> DomEvent {
        let event = DomEvent::click(Some(self.body()));
        self.dispatch(&event);
        event
    }

    pub fn context_menu(&self, node: NodeId, page_x: f64, page_y: f64) -> DomEvent {
        let event = DomEvent::context_menu(Some(node), page_x, page_y);
        self.dispatch(&event);
        event
    }

    pub fn key_down(&self, key: &str, key_code: u32) -> DomEvent {
        let event = DomEvent::key_down(key, key_code).with_target(Some(self.body()));
        self.dispatch(&event);
        event
    }

    pub fn wheel(&self, target: NodeId) -> DomEvent {
        let event = DomEvent::wheel(Some(target));
        self.dispatch(&event);
        event
    }

    pub fn frame_wheel(&self) -> DomEvent {
        let event = DomEvent::frame_wheel();
        self.dispatch(&event);
        event
    }

    pub fn frame_pointer_down(&self) -> DomEvent {
        let event = DomEvent::frame_pointer_down();
        self.dispatch(&event);
        event
    }
}

impl Platform for HeadlessDocument {
    fn create_container(&self, z_index: i32) -> NodeId {
        let mut state = self.state.borrow_mut();
        let mut data = NodeData::element("div");
        data.style.z_index = Some(z_index);
        let id = state.alloc(data);
        let body = state.body;
        state.append(body, id);
        id
    }

    fn render(&self, container: NodeId, view: View) {
        let mut state = self.state.borrow_mut();
        if !state.nodes.contains_key(&container) {
            log::warn!("render into unknown container {container:?}");
            return;
        }
        state.clear_children(container);
        state.insert_view(container, view);
        state.mounted.insert(container);
    }

    fn unmount(&self, container: NodeId) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.mounted.remove(&container) {
            return false;
        }
        state.clear_children(container);
        true
    }

    fn remove_node(&self, node: NodeId) {
        self.state.borrow_mut().remove_subtree(node);
    }

    fn has_ancestor_class(&self, node: NodeId, class: &str) -> bool {
        let state = self.state.borrow();
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(data) = state.nodes.get(&id) else {
                return false;
            };
            if data.classes.iter().any(|c| c == class) {
                return true;
            }
            current = data.parent;
        }
        false
    }

    fn add_listener(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
        listener: &Listener,
    ) {
        let mut state = self.state.borrow_mut();
        // Same listener + type + capture flag registers once, as in the DOM.
        if state
            .listeners
            .iter()
            .any(|r| r.matches(target, kind, phase, listener))
        {
            return;
        }
        state.listeners.push(Registration {
            target,
            kind,
            phase,
            listener: listener.clone(),
        });
    }

    fn remove_listener(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
        listener: &Listener,
    ) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|r| !r.matches(target, kind, phase, listener));
    }

    fn defer(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Listener {
        let log = log.clone();
        Rc::new(move |_: &DomEvent| log.borrow_mut().push(name))
    }

    #[test]
    fn container_is_appended_to_body_with_z_index() {
        let doc = HeadlessDocument::new();
        let container = doc.create_container(1050);
        assert_eq!(doc.body_children(), vec![container]);
        assert_eq!(doc.style_of(container).unwrap().z_index, Some(1050));
        assert!(doc.is_attached(container));
    }

    #[test]
    fn unmount_reports_whether_content_existed() {
        let doc = HeadlessDocument::new();
        let container = doc.create_container(1);
        assert!(!doc.unmount(container));

        doc.render(container, View::new("ul").child(View::new("li").text("Copy")));
        assert!(doc.find_by_text("Copy").is_some());
        assert!(doc.unmount(container));
        assert!(doc.find_by_text("Copy").is_none());
        assert!(!doc.unmount(container));
    }

    #[test]
    fn remove_node_drops_subtree() {
        let doc = HeadlessDocument::new();
        let container = doc.create_container(1);
        doc.render(container, View::new("div").child(View::new("span")));
        assert_eq!(doc.node_count(), 4);
        doc.remove_node(container);
        assert_eq!(doc.node_count(), 1);
        assert!(doc.body_children().is_empty());
    }

    #[test]
    fn dispatch_order_capture_target_bubble() {
        let doc = HeadlessDocument::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let row = doc.append_view(
            doc.body(),
            View::new("div")
                .on(EventKind::Click, recorder(&log, "parent"))
                .child(
                    View::new("span")
                        .text("hit")
                        .on(EventKind::Click, recorder(&log, "target")),
                ),
        );
        let span = doc.children_of(row)[0];

        let doc_capture = recorder(&log, "document-capture");
        let doc_bubble = recorder(&log, "document-bubble");
        let win_capture = recorder(&log, "window-capture");
        doc.add_listener(ListenerTarget::Document, EventKind::Click, Phase::Capture, &doc_capture);
        doc.add_listener(ListenerTarget::Document, EventKind::Click, Phase::Bubble, &doc_bubble);
        doc.add_listener(ListenerTarget::Window, EventKind::Click, Phase::Capture, &win_capture);

        doc.click(span);
        assert_eq!(
            *log.borrow(),
            vec![
                "window-capture",
                "document-capture",
                "target",
                "parent",
                "document-bubble"
            ]
        );
    }

    #[test]
    fn stop_propagation_halts_path() {
        let doc = HeadlessDocument::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_log = log.clone();
        let stopper: Listener = Rc::new(move |e: &DomEvent| {
            inner_log.borrow_mut().push("stopper");
            e.stop_propagation();
        });
        let row = doc.append_view(
            doc.body(),
            View::new("div")
                .on(EventKind::Click, recorder(&log, "parent"))
                .child(View::new("span").on(EventKind::Click, stopper)),
        );
        doc.click(doc.children_of(row)[0]);
        assert_eq!(*log.borrow(), vec!["stopper"]);
    }

    #[test]
    fn duplicate_registration_is_ignored_and_removal_needs_same_phase() {
        let doc = HeadlessDocument::new();
        let listener: Listener = Rc::new(|_: &DomEvent| {});
        doc.add_listener(ListenerTarget::Document, EventKind::Click, Phase::Capture, &listener);
        doc.add_listener(ListenerTarget::Document, EventKind::Click, Phase::Capture, &listener);
        assert_eq!(doc.listener_count(), 1);

        doc.remove_listener(ListenerTarget::Document, EventKind::Click, Phase::Bubble, &listener);
        assert_eq!(doc.listener_count(), 1);
        doc.remove_listener(ListenerTarget::Document, EventKind::Click, Phase::Capture, &listener);
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let doc = Rc::new(HeadlessDocument::new());
        let hits = Rc::new(Cell::new(0));

        let second_hits = hits.clone();
        let second: Listener =
            Rc::new(move |_: &DomEvent| second_hits.set(second_hits.get() + 1));

        let weak_doc = Rc::downgrade(&doc);
        let to_remove = second.clone();
        let first: Listener = Rc::new(move |_: &DomEvent| {
            if let Some(doc) = weak_doc.upgrade() {
                doc.remove_listener(
                    ListenerTarget::Document,
                    EventKind::KeyDown,
                    Phase::Bubble,
                    &to_remove,
                );
            }
        });

        doc.add_listener(ListenerTarget::Document, EventKind::KeyDown, Phase::Bubble, &first);
        doc.add_listener(ListenerTarget::Document, EventKind::KeyDown, Phase::Bubble, &second);
        doc.key_down("a", 65);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn deferred_tasks_run_in_order_including_nested() {
        let doc = Rc::new(HeadlessDocument::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = log.clone();
        let weak = Rc::downgrade(&doc);
        doc.defer(Box::new(move || {
            l1.borrow_mut().push(1);
            let l3 = l1.clone();
            if let Some(doc) = weak.upgrade() {
                doc.defer(Box::new(move || l3.borrow_mut().push(3)));
            }
        }));
        let l2 = log.clone();
        doc.defer(Box::new(move || l2.borrow_mut().push(2)));

        assert_eq!(doc.pending_tasks(), 2);
        assert_eq!(doc.run_pending(), 3);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn frame_events_only_reach_window() {
        let doc = HeadlessDocument::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let on_window = recorder(&log, "window");
        let on_document = recorder(&log, "document");
        doc.add_listener(
            ListenerTarget::Window,
            EventKind::FrameWheel,
            Phase::Bubble,
            &on_window,
        );
        doc.add_listener(
            ListenerTarget::Document,
            EventKind::FrameWheel,
            Phase::Bubble,
            &on_document,
        );
        doc.frame_wheel();
        assert_eq!(*log.borrow(), vec!["window"]);
    }
}
