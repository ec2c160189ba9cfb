//! Type erasure for traced values.
//!
//! The mechanism (tracer, Node, VSpace registry, rule registry) must hold
//! heterogeneous concrete value types behind one graph — a scalar `f64` flows
//! next to an `ndarray::ArrayD<f64>` within the same backward pass. `Value`
//! is the minimal erasure trait that makes that possible: any
//! `T: Clone + Debug + 'static` gets it for free.

use std::any::Any;
use std::fmt::Debug;

/// An erased, clonable value flowing through a trace.
///
/// Never implement this by hand — the blanket impl below covers every
/// concrete value type a primitive can operate on.
pub trait Value {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_value(&self) -> Box<dyn Value>;
    fn debug_fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result;
    /// The concrete type's name, for diagnostics (e.g. an unregistered-type error).
    fn type_name(&self) -> &'static str;
}

impl<T> Value for T
where
    T: Debug + Clone + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn debug_fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl Clone for Box<dyn Value> {
    fn clone(&self) -> Self {
        self.clone_value()
    }
}

impl Debug for dyn Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.debug_fmt(f)
    }
}

/// Downcast a borrowed erased value back to its concrete type.
///
/// Panics if `v` does not actually hold a `T` — a mismatch here is a bug in
/// the rule registry (a primitive registered against the wrong `TypeId`),
/// never a reachable user error.
pub fn downcast_ref<T: 'static>(v: &dyn Value) -> &T {
    v.as_any()
        .downcast_ref::<T>()
        .unwrap_or_else(|| panic!("autodiff-core: value type mismatch, expected {}", std::any::type_name::<T>()))
}

/// Downcast an owned erased value back to its concrete type.
pub fn downcast_owned<T: 'static>(v: Box<dyn Value>) -> T {
    *v.into_any()
        .downcast::<T>()
        .unwrap_or_else(|_| panic!("autodiff-core: value type mismatch, expected {}", std::any::type_name::<T>()))
}

/// Erase a concrete value.
pub fn erase<T: Debug + Clone + 'static>(v: T) -> Box<dyn Value> {
    Box::new(v)
}
