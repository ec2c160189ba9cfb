//! Box/`Traced` — a wrapper pairing a raw value with a Node for a specific
//! trace. A Box-per-value-type lattice is realized here as one generic
//! type parameterized over the concrete value type; primitives are
//! explicit function calls rather than overloaded operators, so there is
//! no per-type operator surface to mirror.

use std::fmt::Debug;

use crate::node::NodeRef;

/// A value paired with the Node that produced it, on one trace.
#[derive(Clone)]
pub struct Boxed<T> {
    pub(crate) value: T,
    pub(crate) node: NodeRef,
}

impl<T: Clone> Boxed<T> {
    pub fn value(&self) -> &T {
        &self.value
    }
}

/// Either a raw value (not on any open trace, or on a trace this primitive's
/// caller isn't observing) or a value boxed on some trace.
///
/// This is the "primitive call discipline" currency type: every argument to
/// a traced primitive is a `Traced<T>`, and every primitive returns one.
#[derive(Clone)]
pub enum Traced<T> {
    Raw(T),
    Boxed(Boxed<T>),
}

impl<T: Clone + Debug + 'static> Traced<T> {
    /// `isbox(x)`.
    pub fn is_boxed(&self) -> bool {
        matches!(self, Traced::Boxed(_))
    }

    /// `getval(x)` — strip one layer, or return `x` unchanged if not boxed.
    pub fn get_val(&self) -> T {
        match self {
            Traced::Raw(v) => v.clone(),
            Traced::Boxed(b) => b.value.clone(),
        }
    }

    pub(crate) fn node(&self) -> Option<&NodeRef> {
        match self {
            Traced::Raw(_) => None,
            Traced::Boxed(b) => Some(&b.node),
        }
    }
}

impl<T> From<T> for Traced<T> {
    fn from(v: T) -> Self {
        Traced::Raw(v)
    }
}

impl<T: Debug> Debug for Traced<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Traced::Raw(v) => write!(f, "Raw({v:?})"),
            Traced::Boxed(b) => write!(f, "Boxed({:?})", b.value),
        }
    }
}
