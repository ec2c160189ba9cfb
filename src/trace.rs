//! Trace tokens and the thread-local stack of open traces, supporting
//! differentiations that nest or re-enter one another.
//!
//! Trace ids are recycled through a `FreeList` id generator: closing a
//! trace releases its id so a later, unrelated trace can reuse it.
//! Traces opened while one is already open (nested differentiation) always
//! receive a strictly fresher id than any still-open trace, so "outermost
//! open trace" reduces to "earliest entry in the stack".

use std::cell::RefCell;

use crate::identity::{Id, IdGenerator, generators::FreeList};

pub type TraceId = Id;

thread_local! {
    static ID_GEN: RefCell<FreeList> = RefCell::new(FreeList::new());
    static OPEN: RefCell<Vec<TraceId>> = const { RefCell::new(Vec::new()) };
}

fn open_trace() -> TraceId {
    let id = ID_GEN.with(|g| g.borrow_mut().fresh());
    OPEN.with(|o| o.borrow_mut().push(id));
    tracing::debug!(trace = %id, "trace opened");
    id
}

fn close_trace(id: TraceId) {
    OPEN.with(|o| {
        let mut o = o.borrow_mut();
        if let Some(pos) = o.iter().rposition(|&t| t == id) {
            o.remove(pos);
        }
    });
    ID_GEN.with(|g| g.borrow_mut().release(id));
    tracing::debug!(trace = %id, "trace closed");
}

pub(crate) fn is_open(id: TraceId) -> bool {
    OPEN.with(|o| o.borrow().contains(&id))
}

/// The outermost (earliest-opened, still-open) trace among `candidates`, if
/// any of them is currently open: a primitive observes the outermost
/// active trace among its arguments.
pub(crate) fn outermost_open(candidates: &[TraceId]) -> Option<TraceId> {
    OPEN.with(|o| {
        o.borrow()
            .iter()
            .find(|id| candidates.contains(id))
            .copied()
    })
}

/// RAII guard: opens a fresh trace on construction, closes it on drop (even
/// if the traced closure panics or returns an error), so a trace can never
/// leak onto the open-trace stack.
pub(crate) struct TraceGuard(TraceId);

impl TraceGuard {
    pub(crate) fn open() -> Self {
        Self(open_trace())
    }

    pub(crate) fn id(&self) -> TraceId {
        self.0
    }
}

impl Drop for TraceGuard {
    fn drop(&mut self) {
        close_trace(self.0);
    }
}
