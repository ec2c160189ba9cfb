//! VSpace registry: maps a value type to its vector-space operations so
//! gradients can be accumulated polymorphically.

mod array;
mod scalar;

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use crate::error::DiffError;
use crate::value::Value;

pub use array::ArrayVSpace;
pub use scalar::ScalarVSpace;

/// Identifies a VSpace's concrete type and parameters (shape, dtype). Two
/// VSpace instances compare equal iff their descriptors compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Scalar,
    Array { shape: Vec<usize> },
}

/// Per-value-type vector-space operations, dispatched dynamically over
/// erased `Value`s so the reverse/forward engines stay generic over any
/// registered value type.
pub trait VSpace: Debug {
    fn descriptor(&self) -> Descriptor;
    fn zeros(&self) -> Box<dyn Value>;
    fn add(&self, x: &dyn Value, y: &dyn Value) -> Box<dyn Value>;
    /// May reuse `x`'s storage; returns the (possibly mutated) sum.
    fn mut_add(&self, x: Box<dyn Value>, y: &dyn Value) -> Box<dyn Value>;
    fn scalar_mul(&self, x: &dyn Value, a: f64) -> Box<dyn Value>;
    fn inner_prod(&self, x: &dyn Value, y: &dyn Value) -> f64;
    /// Involution: identity for real spaces, conjugation for complex ones.
    fn covector(&self, x: &dyn Value) -> Box<dyn Value>;
    fn iscomplex(&self) -> bool {
        false
    }
}

impl PartialEq for dyn VSpace {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor() == other.descriptor()
    }
}

type VSpaceMaker = Arc<dyn Fn(&dyn Value) -> Arc<dyn VSpace> + Send + Sync>;

struct Registration {
    maker: VSpaceMaker,
    type_name: &'static str,
}

/// Process-wide, `TypeId`-keyed registry. Registration is expected to
/// complete before any trace runs; the `RwLock` exists so a long-running
/// host process can still add registrations for new value types it
/// discovers at startup without unsafe global mutable state.
static REGISTRY: RwLock<Option<HashMap<TypeId, Registration>>> = RwLock::new(None);

fn with_registry<R>(f: impl FnOnce(&mut HashMap<TypeId, Registration>) -> R) -> R {
    let mut guard = REGISTRY.write().expect("vspace registry poisoned");
    let map = guard.get_or_insert_with(HashMap::new);
    f(map)
}

/// `VSpace.register(value_type, maker)`.
pub fn register_vspace<T, M>(maker: M)
where
    T: 'static,
    M: Fn(&T) -> Arc<dyn VSpace> + Send + Sync + 'static,
{
    let erased: VSpaceMaker = Arc::new(move |v: &dyn Value| {
        let t = crate::value::downcast_ref::<T>(v);
        maker(t)
    });
    with_registry(|map| {
        map.insert(
            TypeId::of::<T>(),
            Registration {
                maker: erased,
                type_name: std::any::type_name::<T>(),
            },
        );
    });
}

fn unregistered_type_error(actual: &'static str) -> DiffError {
    let guard = REGISTRY.read().expect("vspace registry poisoned");
    let registered = guard
        .as_ref()
        .map(|map| {
            let mut names: Vec<&'static str> = map.values().map(|r| r.type_name).collect();
            names.sort_unstable();
            names.join(", ")
        })
        .unwrap_or_default();
    DiffError::UnregisteredType {
        type_name: actual,
        registered,
    }
}

/// `vspace(v)`. Recurses through one layer of boxing is not needed here
/// because callers always pass the unboxed payload (`Traced::get_val`); the
/// registry itself only ever sees raw values.
pub fn vspace(v: &dyn Value) -> Result<Arc<dyn VSpace>, DiffError> {
    let tid = v.as_any().type_id();
    let guard = REGISTRY.read().expect("vspace registry poisoned");
    let found = guard.as_ref().and_then(|map| map.get(&tid)).map(|r| r.maker(v));
    drop(guard);
    found.ok_or_else(|| unregistered_type_error(v.type_name()))
}

/// Typed convenience wrapper over [`vspace`] for call sites that already
/// know the concrete value type.
pub fn vspace_of<T: Debug + Clone + 'static>(v: &T) -> Result<Arc<dyn VSpace>, DiffError> {
    vspace(v as &dyn Value)
}

/// Installs VSpace registrations for the built-in demonstration value types
/// (`f64`, `ndarray::ArrayD<f64>`). Idempotent; safe to call more than once
/// (e.g. once per test binary).
pub fn install_builtin_vspaces() {
    register_vspace::<f64, _>(|_| Arc::new(ScalarVSpace));
    register_vspace::<ndarray::ArrayD<f64>, _>(|v| Arc::new(ArrayVSpace::new(v.shape().to_vec())));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_type_errors() {
        struct Exotic;
        impl Clone for Exotic {
            fn clone(&self) -> Self {
                Exotic
            }
        }
        impl Debug for Exotic {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "Exotic")
            }
        }
        install_builtin_vspaces();
        let v = Exotic;
        let err = vspace_of(&v).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Exotic"), "message was: {message}");
        assert!(message.contains("f64"), "message was: {message}");
    }

    #[test]
    fn descriptor_equality() {
        install_builtin_vspaces();
        let a = vspace_of(&1.0_f64).unwrap();
        let b = vspace_of(&2.0_f64).unwrap();
        assert_eq!(*a, *b);
    }
}
