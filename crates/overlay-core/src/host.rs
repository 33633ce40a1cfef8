//! Mounts overlays into their own container on `document.body`.
//!
//! `OverlayHost::open` creates the container, portal-renders the anchored
//! menu into it and starts a [`DismissalController`]. The returned
//! [`OverlayHandle`] is the release side: `destroy` stops the controller,
//! unmounts, removes the container and frees the global gate, exactly once.

use crate::anchor::{AnchoredMenu, PagePoint};
use crate::config::OverlayConfig;
use crate::dismiss::{Dismissal, DismissalController};
use crate::dom::{NodeId, Platform};
use crate::gate::GlobalMenuGate;
use crate::menu::{ClickHandler, MenuDescriptor};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Opens overlays on one platform, guarded by one gate.
#[derive(Clone)]
pub struct OverlayHost {
    platform: Rc<dyn Platform>,
    gate: Rc<GlobalMenuGate>,
    config: OverlayConfig,
}

impl OverlayHost {
    /// Host on `platform` using the thread's shared gate.
    pub fn new(platform: Rc<dyn Platform>) -> Self {
        Self::with_gate(platform, GlobalMenuGate::shared())
    }

    pub fn with_gate(platform: Rc<dyn Platform>, gate: Rc<GlobalMenuGate>) -> Self {
        Self {
            platform,
            gate,
            config: OverlayConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OverlayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn gate(&self) -> &Rc<GlobalMenuGate> {
        &self.gate
    }

    /// Mount `descriptor` anchored at `anchor`.
    ///
    /// The caller must already hold the gate; the handle releases it.
    pub fn open(&self, descriptor: &MenuDescriptor, anchor: PagePoint) -> OverlayHandle {
        self.mount(descriptor, anchor, None)
    }

    /// Like [`open`](Self::open), with `after_select` run after every item
    /// selection.
    pub fn open_with_after_select(
        &self,
        descriptor: &MenuDescriptor,
        anchor: PagePoint,
        after_select: ClickHandler,
    ) -> OverlayHandle {
        self.mount(descriptor, anchor, Some(after_select))
    }

    fn mount(
        &self,
        descriptor: &MenuDescriptor,
        anchor: PagePoint,
        after_select: Option<ClickHandler>,
    ) -> OverlayHandle {
        let menu = {
            let _unwind = ReleaseOnUnwind(&self.gate);
            descriptor.resolve()
        };

        let mut anchored = AnchoredMenu::new(menu, anchor);
        if let Some(handler) = after_select {
            anchored = anchored.after_select(handler);
        }

        let container = self.platform.create_container(self.config.z_index);
        self.platform
            .render(container, anchored.render(&self.config));

        let instance = Rc::new(OverlayInstance {
            container,
            platform: self.platform.clone(),
            gate: self.gate.clone(),
            destroyed: Cell::new(false),
            controller: RefCell::new(DismissalController::new(&self.config)),
        });

        // The listeners keep the instance alive until it is destroyed, so a
        // caller may drop the handle of a fire-and-forget menu.
        let target = instance.clone();
        let on_close: Rc<dyn Fn()> = Rc::new(move || target.destroy());
        instance
            .controller
            .borrow_mut()
            .start(&self.platform, on_close);

        log::debug!(
            "overlay opened in {container:?} at ({}, {})",
            anchor.x,
            anchor.y
        );
        OverlayHandle(instance)
    }
}

/// Frees the gate if a menu builder panics between acquire and mount.
struct ReleaseOnUnwind<'a>(&'a GlobalMenuGate);

impl Drop for ReleaseOnUnwind<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.release();
        }
    }
}

struct OverlayInstance {
    container: NodeId,
    platform: Rc<dyn Platform>,
    gate: Rc<GlobalMenuGate>,
    destroyed: Cell<bool>,
    controller: RefCell<DismissalController>,
}

impl OverlayInstance {
    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        self.controller.borrow_mut().stop();
        if self.platform.unmount(self.container) {
            self.platform.remove_node(self.container);
        }
        self.gate.release();
        log::debug!("overlay in {:?} destroyed", self.container);
    }
}

/// Handle to one open overlay.
#[derive(Clone)]
pub struct OverlayHandle(Rc<OverlayInstance>);

impl OverlayHandle {
    /// Close the overlay. Later calls do nothing.
    pub fn destroy(&self) {
        self.0.destroy();
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.get()
    }

    pub fn container(&self) -> NodeId {
        self.0.container
    }

    /// The dropdown changed its own visibility (e.g. its trigger was
    /// clicked again). `false` closes the overlay.
    pub fn notify_visible_change(&self, visible: bool) {
        let decision = self.0.controller.borrow().visibility_changed(visible);
        if decision == Dismissal::Close {
            self.destroy();
        }
    }
}

impl std::fmt::Debug for OverlayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayHandle")
            .field("container", &self.0.container)
            .field("destroyed", &self.0.destroyed.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessDocument;
    use crate::menu::{Menu, MenuItem};

    fn host(doc: &Rc<HeadlessDocument>) -> OverlayHost {
        OverlayHost::with_gate(doc.clone(), Rc::new(GlobalMenuGate::new()))
    }

    fn menu() -> MenuDescriptor {
        Menu::new().item(MenuItem::action("copy", "Copy")).into()
    }

    #[test]
    fn open_mounts_container_on_body() {
        let doc = HeadlessDocument::shared();
        let host = host(&doc);
        assert!(host.gate().try_acquire());
        let handle = host.open(&menu(), PagePoint::new(5.0, 6.0));

        assert_eq!(doc.body_children(), vec![handle.container()]);
        assert_eq!(doc.style_of(handle.container()).unwrap().z_index, Some(1050));
        assert!(doc.find_by_text("Copy").is_some());
        assert_eq!(doc.listener_count(), 5);
    }

    #[test]
    fn destroy_twice_is_harmless() {
        let doc = HeadlessDocument::shared();
        let host = host(&doc);
        assert!(host.gate().try_acquire());
        let handle = host.open(&menu(), PagePoint::default());

        handle.destroy();
        assert!(doc.body_children().is_empty());
        assert!(!host.gate().is_held());
        assert_eq!(doc.listener_count(), 0);

        // A new menu takes the gate; a stale destroy must not free it.
        assert!(host.gate().try_acquire());
        handle.destroy();
        assert!(host.gate().is_held());
    }

    #[test]
    fn visibility_false_destroys() {
        let doc = HeadlessDocument::shared();
        let host = host(&doc);
        assert!(host.gate().try_acquire());
        let handle = host.open(&menu(), PagePoint::default());
        handle.notify_visible_change(true);
        assert!(!handle.is_destroyed());
        handle.notify_visible_change(false);
        assert!(handle.is_destroyed());
        assert!(doc.body_children().is_empty());
    }

    #[test]
    fn panicking_builder_releases_gate() {
        let doc = HeadlessDocument::shared();
        let host = host(&doc);
        let descriptor = MenuDescriptor::lazy(|| panic!("menu construction failed"));
        assert!(host.gate().try_acquire());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            host.open(&descriptor, PagePoint::default());
        }));
        assert!(result.is_err());
        assert!(!host.gate().is_held());
        assert!(doc.body_children().is_empty());
    }
}
