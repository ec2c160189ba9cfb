//! End-to-end scenarios exercised entirely through the public API, as
//! opposed to the unit tests inside `src/` which reach into crate-internal
//! pieces.

use autodiff_core::ops::{add, exp, log, mul, sum};
use autodiff_core::value::{Value, downcast_ref, erase};
use autodiff_core::vspace::{VSpace, install_builtin_vspaces, vspace_of};
use autodiff_core::{DiffError, Traced, make_jvp, make_vjp};
use ndarray::ArrayD;

fn setup() {
    install_builtin_vspaces();
    let _ = autodiff_core::ops::install_builtin_primitives();
}

/// `f(x) = x^2 + 3x + 1`, shared by the reverse- and forward-mode halves of
/// the duality check below — a plain fn item rather than a closure so the
/// same code can be handed to both engines.
fn quadratic(x: Traced<f64>) -> Result<Traced<f64>, DiffError> {
    let x2 = mul(x.clone(), x.clone())?;
    let three_x = mul(Traced::from(3.0_f64), x)?;
    let total = add(x2, three_x)?;
    add(total, Traced::from(1.0_f64))
}

#[test]
fn quadratic_function_reverse_mode() {
    setup();
    // f(x) = x^2 + 3x + 1, f'(x) = 2x + 3
    let (y, vjp) = make_vjp(
        |x: Traced<f64>| {
            let x2 = mul(x.clone(), x.clone())?;
            let three_x = mul(Traced::from(3.0_f64), x)?;
            let total = add(x2, three_x)?;
            add(total, Traced::from(1.0_f64))
        },
        2.0_f64,
    )
    .unwrap();
    assert_eq!(y.get_val(), 11.0);
    let g = vjp(erase(1.0_f64)).unwrap();
    assert_eq!(*downcast_ref::<f64>(g.as_ref()), 7.0);
}

#[test]
fn log_at_e_reverse_and_forward_agree() {
    setup();
    let (y_rev, vjp) = make_vjp(log, std::f64::consts::E).unwrap();
    assert!((y_rev.get_val() - 1.0).abs() < 1e-12);
    let g_rev = vjp(erase(1.0_f64)).unwrap();

    let jvp_fwd = make_jvp(log, std::f64::consts::E);
    let (y_fwd, tangent) = jvp_fwd(erase(1.0_f64)).unwrap();
    assert_eq!(y_rev.get_val(), y_fwd.get_val());
    assert!(
        (*downcast_ref::<f64>(g_rev.as_ref()) - *downcast_ref::<f64>(tangent.as_ref())).abs() < 1e-12
    );
}

#[test]
fn diamond_dependency_accumulates_both_paths() {
    setup();
    // h = x + x, f = h * h = 4x^2, f'(x) = 8x
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

#[test]
fn output_independent_of_input_has_zero_gradient() {
    setup();
    let (y, vjp) = make_vjp(|_x: Traced<f64>| Ok(Traced::from(5.0_f64)), 42.0_f64).unwrap();
    assert_eq!(y.get_val(), 5.0);
    let g = vjp(erase(1.0_f64)).unwrap();
    assert_eq!(*downcast_ref::<f64>(g.as_ref()), 0.0);
}

#[test]
fn exp_of_array_sum_reduces_to_scalar() {
    setup();
    // f(x) = sum(x), with x a 3-element array of constant 2.0, f(x) = 6.
    let x = ArrayD::<f64>::from_elem(vec![3], 2.0);
    let (y, vjp) = make_vjp(sum, x).unwrap();
    assert_eq!(y.get_val(), 6.0);
    let g = vjp(erase(1.0_f64)).unwrap();
    let g = downcast_ref::<ArrayD<f64>>(g.as_ref());
    assert!(g.iter().all(|&v| v == 1.0));
}

#[test]
fn exp_reverse_mode_matches_its_own_value() {
    setup();
    // d/dx[exp(x)] = exp(x)
    let (y, vjp) = make_vjp(exp, 0.0_f64).unwrap();
    assert_eq!(y.get_val(), 1.0);
    let g = vjp(erase(1.0_f64)).unwrap();
    assert_eq!(*downcast_ref::<f64>(g.as_ref()), 1.0);
}

/// Duality: `⟨jvp(v), u⟩ = ⟨v, vjp(u)⟩` for any pair of tangent/cotangent
/// seeds `v`, `u`, since both sides compute `f'(x) * v * u` for a
/// scalar-valued `f`.
#[test]
fn jvp_and_vjp_are_dual() {
    setup();
    let x = 2.0_f64;
    let (_y, vjp) = make_vjp(quadratic, x).unwrap();
    let jvp = make_jvp(quadratic, x);

    let v = 2.0_f64;
    let u = 5.0_f64;
    let (_, tangent) = jvp(erase(v)).unwrap();
    let cotangent = vjp(erase(u)).unwrap();

    let vs = vspace_of(&x).unwrap();
    let lhs = vs.inner_prod(tangent.as_ref(), &erase(u) as &dyn Value);
    let rhs = vs.inner_prod(&erase(v) as &dyn Value, cotangent.as_ref());
    assert!((lhs - rhs).abs() < 1e-12);
}

/// `vjp` borrows its captured end node rather than consuming it, so the
/// same closure can be called again with a different seed — this is what
/// makes linearity of `vjp` in `g` testable at all.
#[test]
fn vjp_is_linear_in_seed() {
    setup();
    let (_y, vjp) = make_vjp(quadratic, 2.0_f64).unwrap();
    let g1 = vjp(erase(3.0_f64)).unwrap();
    let g2 = vjp(erase(5.0_f64)).unwrap();
    let combined = vjp(erase(3.0_f64 + 5.0_f64)).unwrap();
    let sum = *downcast_ref::<f64>(g1.as_ref()) + *downcast_ref::<f64>(g2.as_ref());
    assert!((sum - *downcast_ref::<f64>(combined.as_ref())).abs() < 1e-12);
}

/// Covector involution: for a real-valued space `covector` is the identity,
/// so applying it twice is a no-op, for both value types the crate registers.
#[test]
fn covector_is_involutive() {
    setup();
    let x = erase(3.5_f64);
    let vs = vspace_of(&3.5_f64).unwrap();
    let twice = vs.covector(vs.covector(x.as_ref()).as_ref());
    assert_eq!(*downcast_ref::<f64>(twice.as_ref()), 3.5);

    let arr = ArrayD::<f64>::from_elem(vec![2], 4.0);
    let vs_arr = vspace_of(&arr).unwrap();
    let boxed = erase(arr.clone());
    let twice_arr = vs_arr.covector(vs_arr.covector(boxed.as_ref()).as_ref());
    assert_eq!(*downcast_ref::<ArrayD<f64>>(twice_arr.as_ref()), arr);
}

#[test]
fn two_argument_function_gradient_in_first_argument() {
    setup();
    // f(x, y) = x*y + x at (x=2, y=3): df/dx = y + 1 = 4
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
