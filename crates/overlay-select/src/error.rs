//! Invariant breaks in the multi-select engine.
//!
//! None of these are user-facing conditions: each one means the host fed
//! the engine an event sequence a browser never produces, or changed props
//! underneath a gesture in progress.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    /// Drag-end arrived with no drag-start recorded before it.
    #[error("drag ended without a recorded drag start")]
    DragNotStarted,

    /// A reorder must be committed but no `on_reorder` handler is attached.
    #[error("reorder committed but no on_reorder handler is attached")]
    ReorderUnavailable,

    /// An event referenced a pill or option that is not rendered.
    #[error("index {index} is out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type SelectResult<T> = Result<T, SelectError>;
