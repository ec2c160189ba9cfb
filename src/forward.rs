//! Forward-mode engine: `make_jvp` traces a function with
//! one boxed input, seeded with a tangent on that input, and returns the
//! tangent carried by the output. Unlike reverse mode there is no separate
//! backward pass — each primitive call propagates its output tangent
//! eagerly (see `src/tracer.rs`), so the tangent is just whatever the end
//! node's payload holds once tracing finishes.

use crate::boxed::{Boxed, Traced};
use crate::error::DiffError;
use crate::node::Node;
use crate::trace::TraceGuard;
use crate::value::Value;
use crate::vspace::vspace;

/// `make_jvp(fun, x) -> jvp`: returns a closure that, given a tangent `g` for
/// `x`, opens a fresh trace, boxes `x` on it with `g` as the root tangent,
/// re-runs `fun` from scratch, and returns the output tangent it carries.
/// Unlike reverse mode there is no graph to replay for a second tangent —
/// forward mode retraces `fun` once per call, exactly as many times as the
/// caller calls `jvp`. If the output never depended on `x`, the tangent is
/// `vspace(y).zeros()`.
pub fn make_jvp<T, F>(
    f: F,
    input: T,
) -> impl Fn(Box<dyn Value>) -> Result<(Traced<T>, Box<dyn Value>), DiffError>
where
    T: Clone + std::fmt::Debug + 'static,
    F: Fn(Traced<T>) -> Result<Traced<T>, DiffError>,
{
    move |tangent: Box<dyn Value>| {
        let guard = TraceGuard::open();
        let trace = guard.id();
        let root = Node::root_jvp(trace, tangent);
        let boxed_input = Traced::Boxed(Boxed {
            value: input.clone(),
            node: root,
        });
        let end = f(boxed_input)?;
        drop(guard);

        match end.node() {
            Some(node) if node.trace == trace => {
                let tangent_out = node.tangent().clone_value();
                Ok((end.clone(), tangent_out))
            }
            _ => {
                tracing::warn!("output independent of input; tangent is zero");
                let vs = vspace(&input)?;
                Ok((end, vs.zeros()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{downcast_ref, erase};
    use crate::vspace::install_builtin_vspaces;

    #[test]
    fn independent_output_yields_zero_tangent() {
        install_builtin_vspaces();
        let jvp = make_jvp(|_x: Traced<f64>| Ok(Traced::from(5.0_f64)), 3.0_f64);
        let (_y, tangent) = jvp(erase(1.0_f64)).unwrap();
        assert_eq!(*downcast_ref::<f64>(tangent.as_ref()), 0.0);
    }

    #[test]
    fn same_jvp_closure_callable_with_multiple_tangents() {
        install_builtin_vspaces();
        crate::ops::install_builtin_primitives().unwrap();
        let jvp = make_jvp(|x: Traced<f64>| crate::ops::exp(x), 1.0_f64);
        let (_y1, t1) = jvp(erase(1.0_f64)).unwrap();
        let (_y2, t2) = jvp(erase(2.0_f64)).unwrap();
        assert!((*downcast_ref::<f64>(t1.as_ref()) - std::f64::consts::E).abs() < 1e-12);
        assert!((*downcast_ref::<f64>(t2.as_ref()) - 2.0 * std::f64::consts::E).abs() < 1e-12);
    }
}
