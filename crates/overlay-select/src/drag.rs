//! Drag-to-reorder state machine for selected pills.
//!
//! `Idle` → `start` → `Dragging { from, to: None }` → `over` records the
//! hovered slot → `end` clears everything and reports the move, if any.
//! The selection itself is never mutated here: `preview` computes the order
//! shown while dragging, and the real reorder is the caller's business.

use crate::error::{SelectError, SelectResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// `item_key` of the dragged item.
        key: String,
        from: usize,
        to: Option<usize>,
    },
}

impl DragState {
    /// Begin dragging the item at `from`. Replaces any drag in progress.
    pub fn start(&mut self, key: impl Into<String>, from: usize) {
        let key = key.into();
        log::trace!("drag start: {key} at {from}");
        *self = DragState::Dragging { key, from, to: None };
    }

    /// Record `index` as the drop slot. Returns `true` only when the slot
    /// changed, so hosts can skip redundant re-renders. Ignored when idle.
    pub fn over(&mut self, index: usize) -> bool {
        match self {
            DragState::Dragging { to, .. } if *to != Some(index) => {
                *to = Some(index);
                true
            }
            _ => false,
        }
    }

    /// Finish the gesture. The state is `Idle` afterwards on every path.
    ///
    /// Returns `Some((from, to))` when a slot was recorded and differs from
    /// the origin, `None` for a drag that moved nothing.
    pub fn end(&mut self) -> SelectResult<Option<(usize, usize)>> {
        match std::mem::take(self) {
            DragState::Idle => Err(SelectError::DragNotStarted),
            DragState::Dragging { from, to, .. } => {
                Ok(to.filter(|&to| to != from).map(|to| (from, to)))
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    pub fn dragged_key(&self) -> Option<&str> {
        match self {
            DragState::Dragging { key, .. } => Some(key.as_str()),
            DragState::Idle => None,
        }
    }

    /// The order to display: `items` with the dragged entry moved to the
    /// hovered slot, or `items` unchanged when no slot is recorded.
    pub fn preview<T: Clone>(&self, items: &[T]) -> SelectResult<Vec<T>> {
        match self {
            DragState::Dragging { from, to: Some(to), .. } => array_move_index(items, *from, *to),
            _ => Ok(items.to_vec()),
        }
    }
}

/// Copy of `items` with the element at `from` removed and reinserted at `to`.
pub fn array_move_index<T: Clone>(items: &[T], from: usize, to: usize) -> SelectResult<Vec<T>> {
    let len = items.len();
    for index in [from, to] {
        if index >= len {
            return Err(SelectError::IndexOutOfRange { index, len });
        }
    }
    let mut moved = items.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    Ok(moved)
}
