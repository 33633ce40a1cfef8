//! Application-wide "a context menu is open" flag.
//!
//! A single-slot lock with no waiting: `try_acquire` either takes the slot
//! or reports that someone else holds it, and the caller drops its request.
//! Two nested right-click targets firing in the same bubble therefore open
//! one menu, not two.

use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct GlobalMenuGate {
    held: Cell<bool>,
}

thread_local! {
    static SHARED_GATE: Rc<GlobalMenuGate> = Rc::new(GlobalMenuGate::new());
}

impl GlobalMenuGate {
    pub fn new() -> Self {
        Self {
            held: Cell::new(false),
        }
    }

    /// The gate shared by every host on the UI thread.
    pub fn shared() -> Rc<GlobalMenuGate> {
        SHARED_GATE.with(Rc::clone)
    }

    /// Take the gate. Returns `false` (and changes nothing) if it is held.
    pub fn try_acquire(&self) -> bool {
        if self.held.get() {
            log::debug!("menu gate held; dropping open request");
            return false;
        }
        self.held.set(true);
        true
    }

    /// Clear the gate. Idempotent.
    pub fn release(&self) {
        self.held.set(false);
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_is_exclusive() {
        let gate = GlobalMenuGate::new();
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
        assert!(gate.is_held());
    }

    #[test]
    fn release_is_idempotent() {
        let gate = GlobalMenuGate::new();
        gate.release();
        assert!(gate.try_acquire());
        gate.release();
        gate.release();
        assert!(!gate.is_held());
        assert!(gate.try_acquire());
    }

    #[test]
    fn shared_gate_is_one_instance_per_thread() {
        let a = GlobalMenuGate::shared();
        let b = GlobalMenuGate::shared();
        assert!(Rc::ptr_eq(&a, &b));
    }
}
