//! # autodiff-core
//!
//! Core tracer, Box/Node machinery, VSpace abstraction, and reverse/forward
//! derivative engines for automatic differentiation, independent of any
//! particular numeric backend.
//!
//! The central idea, common to reverse- and forward-mode differentiation
//! alike, is "boxing": a primitive function's argument is wrapped, on a
//! particular trace, in a `Traced` value that carries a `Node` recording
//! how that value was produced. A primitive that sees a boxed argument on
//! the active trace emits a new `Node` for its result instead of just
//! computing the raw answer; a primitive that sees only raw values or
//! boxes on an inactive trace computes the raw answer and nothing else.
//!
//! ```
//! use autodiff_core::prelude::*;
//! use autodiff_core::ops::log;
//! use autodiff_core::value::erase;
//!
//! install_builtin_vspaces();
//! install_builtin_primitives().unwrap();
//!
//! // d/dx [ log(x) ] at x = e is 1/e
//! let (y, vjp) = make_vjp(log, std::f64::consts::E).unwrap();
//! assert!((y.get_val() - 1.0).abs() < 1e-12);
//! let grad = vjp(erase(1.0_f64)).unwrap();
//! ```

pub mod boxed;
pub mod error;
pub mod forward;
pub mod identity;
mod node;
pub mod ops;
pub mod outgrad;
pub mod registry;
pub mod reverse;
mod trace;
mod tracer;
pub mod value;
pub mod vspace;

pub use boxed::{Boxed, Traced};
pub use error::{DiffError, Mode};
pub use forward::make_jvp;
pub use reverse::make_vjp;

/// A prelude bringing in the pieces most callers need: the `Traced`
/// wrapper, the error type, the two derivative engines, and the
/// registration entry points for VSpaces and primitives.
pub mod prelude {
    pub use crate::boxed::Traced;
    pub use crate::error::DiffError;
    pub use crate::forward::make_jvp;
    pub use crate::ops::install_builtin_primitives;
    pub use crate::reverse::make_vjp;
    pub use crate::vspace::install_builtin_vspaces;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{add, exp, mul, sum};
    use crate::value::{downcast_ref, erase};
    use crate::vspace::install_builtin_vspaces;
    use ndarray::ArrayD;

    fn setup() {
        install_builtin_vspaces();
        let _ = ops::install_builtin_primitives();
    }

    /// `f(x) = x^2 + 3x + 1`; `f'(x) = 2x + 3`, so `f'(2) = 7`.
    #[test]
    fn quadratic_reverse_mode() {
        setup();
        let (y, vjp) = make_vjp(
            |x: Traced<f64>| {
                let x2 = mul(x.clone(), x.clone())?;
                let three_x = mul(Traced::from(3.0_f64), x)?;
                let sum1 = add(x2, three_x)?;
                add(sum1, Traced::from(1.0_f64))
            },
            2.0_f64,
        )
        .unwrap();
        assert_eq!(y.get_val(), 11.0);
        let g = vjp(erase(1.0_f64)).unwrap();
        assert_eq!(*downcast_ref::<f64>(g.as_ref()), 7.0);
    }

    /// `f(x) = x*y + x` at `x=2, y=3`: `df/dx = y + 1 = 4`.
    #[test]
    fn two_argument_function_differentiated_in_first_arg() {
        setup();
        let (y, vjp) = make_vjp(
            |x: Traced<f64>| {
                let xy = mul(x.clone(), Traced::from(3.0_f64))?;
                add(xy, x)
            },
            2.0_f64,
        )
        .unwrap();
        assert_eq!(y.get_val(), 8.0);
        let g = vjp(erase(1.0_f64)).unwrap();
        assert_eq!(*downcast_ref::<f64>(g.as_ref()), 4.0);
    }

    /// Diamond dependency: `h = x + x`, `f = h * h`; `f = 4x^2`, `f'(x) = 8x`.
    #[test]
    fn diamond_dependency_sums_both_paths() {
        setup();
        let (y, vjp) = make_vjp(
            |x: Traced<f64>| {
                let h = add(x.clone(), x)?;
                mul(h.clone(), h)
            },
            3.0_f64,
        )
        .unwrap();
        assert_eq!(y.get_val(), 36.0);
        let g = vjp(erase(1.0_f64)).unwrap();
        assert_eq!(*downcast_ref::<f64>(g.as_ref()), 24.0);
    }

    /// The output never touches `x`; the gradient is zero without a
    /// backward pass ever running.
    #[test]
    fn independent_output_has_zero_gradient() {
        setup();
        let (y, vjp) = make_vjp(|_x: Traced<f64>| Ok(Traced::from(5.0_f64)), 9.0_f64).unwrap();
        assert_eq!(y.get_val(), 5.0);
        let g = vjp(erase(1.0_f64)).unwrap();
        assert_eq!(*downcast_ref::<f64>(g.as_ref()), 0.0);
    }

    /// A `make_vjp` call nested inside another's traced closure opens a
    /// second, independent trace; closing it must not disturb the outer
    /// trace's own bookkeeping.
    #[test]
    fn nested_trace_does_not_corrupt_outer_trace() {
        setup();
        let (y, outer_vjp) = make_vjp(
            |x: Traced<f64>| {
                let (inner_y, inner_vjp) =
                    make_vjp(|z: Traced<f64>| mul(z.clone(), z), 10.0_f64).unwrap();
                assert_eq!(inner_y.get_val(), 100.0);
                let inner_g = inner_vjp(erase(1.0_f64)).unwrap();
                assert_eq!(*downcast_ref::<f64>(inner_g.as_ref()), 20.0);

                mul(x.clone(), x)
            },
            5.0_f64,
        )
        .unwrap();
        assert_eq!(y.get_val(), 25.0);
        let g = outer_vjp(erase(1.0_f64)).unwrap();
        assert_eq!(*downcast_ref::<f64>(g.as_ref()), 10.0);
    }

    #[test]
    fn array_sum_duality_with_scalar_reverse_mode() {
        setup();
        let x = ArrayD::<f64>::from_elem(vec![4], 1.5);
        let (y, vjp) = make_vjp(sum, x).unwrap();
        assert_eq!(y.get_val(), 6.0);
        let g = vjp(erase(1.0_f64)).unwrap();
        let g = downcast_ref::<ArrayD<f64>>(g.as_ref());
        assert!(g.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn forward_mode_matches_reverse_mode_on_exp() {
        setup();
        let (y_rev, vjp) = make_vjp(exp, 1.0_f64).unwrap();
        let g_rev = vjp(erase(1.0_f64)).unwrap();

        let jvp = make_jvp(exp, 1.0_f64);
        let (y_fwd, tangent) = jvp(erase(1.0_f64)).unwrap();

        assert_eq!(y_rev.get_val(), y_fwd.get_val());
        assert_eq!(
            *downcast_ref::<f64>(g_rev.as_ref()),
            *downcast_ref::<f64>(tangent.as_ref())
        );
    }
}
