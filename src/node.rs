//! Node: one per boxed output of a primitive call.

use std::rc::Rc;

use crate::error::DiffError;
use crate::trace::TraceId;
use crate::value::Value;

/// `g ↦ tuple(ingrads)`, in `parents` order. Stored behind `Result` because a
/// missing rule is discovered lazily, the first (and only) time this closure
/// is invoked by the backward pass.
pub(crate) type VjpFn = Box<dyn Fn(&dyn Value) -> Result<Vec<Box<dyn Value>>, DiffError>>;

pub(crate) enum Payload {
    Vjp(VjpFn),
    Jvp(Box<dyn Value>),
}

pub struct Node {
    pub(crate) trace: TraceId,
    pub(crate) parents: Vec<NodeRef>,
    pub(crate) payload: Payload,
}

/// Nodes are reference-counted within one trace; once the backward pass (or
/// the forward trace) finishes and the end node's handle is dropped, every
/// interior Node reachable only from it is collected. Single-threaded by
/// construction (`Rc`, not `Arc`): one differentiation runs on one thread,
/// cooperatively.
pub type NodeRef = Rc<Node>;

impl Node {
    pub(crate) fn root_vjp(trace: TraceId) -> NodeRef {
        Rc::new(Node {
            trace,
            parents: Vec::new(),
            payload: Payload::Vjp(Box::new(|_| Ok(Vec::new()))),
        })
    }

    pub(crate) fn root_jvp(trace: TraceId, tangent: Box<dyn Value>) -> NodeRef {
        Rc::new(Node {
            trace,
            parents: Vec::new(),
            payload: Payload::Jvp(tangent),
        })
    }

    pub(crate) fn interior_vjp(trace: TraceId, parents: Vec<NodeRef>, vjp_fn: VjpFn) -> NodeRef {
        Rc::new(Node {
            trace,
            parents,
            payload: Payload::Vjp(vjp_fn),
        })
    }

    pub(crate) fn interior_jvp(
        trace: TraceId,
        parents: Vec<NodeRef>,
        tangent: Box<dyn Value>,
    ) -> NodeRef {
        Rc::new(Node {
            trace,
            parents,
            payload: Payload::Jvp(tangent),
        })
    }

    pub(crate) fn is_reverse(&self) -> bool {
        matches!(self.payload, Payload::Vjp(_))
    }

    pub(crate) fn tangent(&self) -> &dyn Value {
        match &self.payload {
            Payload::Jvp(g) => g.as_ref(),
            Payload::Vjp(_) => unreachable!("tangent() on a reverse-mode node"),
        }
    }

    pub(crate) fn call_vjp(&self, g: &dyn Value) -> Result<Vec<Box<dyn Value>>, DiffError> {
        match &self.payload {
            Payload::Vjp(f) => f(g),
            Payload::Jvp(_) => unreachable!("call_vjp() on a forward-mode node"),
        }
    }

    /// Identity key for the `outgrads` accumulation map — distinct Nodes
    /// never share an address while both are alive.
    pub(crate) fn key(node: &NodeRef) -> usize {
        Rc::as_ptr(node) as usize
    }
}
