//! Demonstration primitives built on the tracer: arithmetic, `exp`, `log`,
//! and a reduction, enough to exercise both value types end to end.
//! Downstream crates register their own primitives the same way: a marker
//! type, a forward function, and a call to `registry::defvjp`/`defjvp`
//! (or `def_linear`).

pub(crate) mod macros;

mod array;
mod scalar;

pub use array::{
    ArrayAdd, ArrayMul, ArrayNeg, ArraySub, Sum, array_add, array_mul, array_neg, array_sub, shape, sum,
};
pub use scalar::{Add, Div, Exp, Log, Mul, Neg, Sub, add, div, exp, log, mul, neg, sub};

/// Registers every primitive's forward function and derivative rules.
/// Idempotent; call once during process startup (or once per test binary)
/// before tracing anything.
pub fn install_builtin_primitives() -> Result<(), crate::error::DiffError> {
    scalar::install_all()?;
    array::install_all()?;
    Ok(())
}
