//! Reverse-mode engine: `make_vjp` traces a function with
//! one boxed input and returns both its (possibly still-boxed) result and a
//! closure that runs the backward pass for a given seed gradient.

use std::collections::HashMap;

use crate::boxed::{Boxed, Traced};
use crate::error::DiffError;
use crate::node::{Node, NodeRef};
use crate::outgrad::{Outgrad, add_outgrads, materialize};
use crate::trace::TraceGuard;
use crate::value::Value;
use crate::vspace::vspace;

/// Kahn's-algorithm topological order of `end`'s ancestor graph (matching
/// the reference implementation's `toposort`, not a grey/black DFS):
/// a first pass counts, for every ancestor, how many times it is reached as
/// a parent; a second pass peels off nodes once all of their children have
/// already been visited, so every Node is yielded only after every path
/// from `end` through it has contributed.
fn toposort(end: &NodeRef) -> Vec<NodeRef> {
    let mut counts: HashMap<usize, (NodeRef, usize)> = HashMap::new();
    let mut stack = vec![end.clone()];
    while let Some(node) = stack.pop() {
        let key = Node::key(&node);
        if let Some(entry) = counts.get_mut(&key) {
            entry.1 += 1;
        } else {
            let parents = node.parents.clone();
            counts.insert(key, (node, 1));
            stack.extend(parents);
        }
    }

    let mut childless = vec![end.clone()];
    let mut order = Vec::new();
    while let Some(node) = childless.pop() {
        order.push(node.clone());
        for parent in &node.parents {
            let pkey = Node::key(parent);
            let entry = counts
                .get_mut(&pkey)
                .expect("every parent was counted in the first pass");
            if entry.1 == 1 {
                childless.push(parent.clone());
            } else {
                entry.1 -= 1;
            }
        }
    }
    order
}

/// `backward_pass(g, end_node)`: seed `end`'s outgrad with `seed`, visit
/// every ancestor in topological order, and return the outgrad of whichever
/// node is visited last — the root, for a single-input trace.
pub(crate) fn backward_pass(seed: Box<dyn Value>, end: &NodeRef) -> Result<Box<dyn Value>, DiffError> {
    let order = toposort(end);
    let mut outgrads: HashMap<usize, Outgrad> = HashMap::new();
    outgrads.insert(Node::key(end), Outgrad::dense(seed));

    let mut result = None;
    for node in &order {
        let key = Node::key(node);
        let outgrad = outgrads
            .remove(&key)
            .expect("toposort visits a node only after its own outgrad has been seeded");
        let g = materialize(outgrad);
        let ingrads = node.call_vjp(g.as_ref())?;
        let pairs = itertools::Itertools::zip_longest(node.parents.iter(), ingrads.into_iter());
        for pair in pairs {
            use itertools::EitherOrBoth::Both;
            let Both(parent, ingrad) = pair else {
                return Err(DiffError::DifferentiationInvalid {
                    primitive: "<vjp>",
                    reason: "vjp produced a different number of ingrads than the node has parents".into(),
                });
            };
            let pkey = Node::key(parent);
            let existing = outgrads.remove(&pkey);
            let combined = add_outgrads(existing, Outgrad::dense(ingrad))?;
            outgrads.insert(pkey, combined);
        }
        result = Some(g);
    }
    Ok(result.expect("end node is always visited first"))
}

/// `make_vjp(fun, x)`: opens a fresh trace, boxes `x` on it as the trace's
/// root, runs `fun`, and returns the (possibly still-boxed) result together
/// with a closure computing the gradient w.r.t. `x` for a given seed. The
/// closure only borrows the captured end node, so the same `vjp` can be
/// called again with a different seed — `end_node` is re-traversed for
/// each `g`, never consumed.
///
/// If `fun`'s result never touched `x`, the
/// returned closure produces `vspace(x).zeros()` without running a
/// backward pass at all, exactly like a traced computation that happened to
/// not depend on its input.
pub fn make_vjp<T, F>(
    f: F,
    input: T,
) -> Result<
    (
        Traced<T>,
        impl Fn(Box<dyn Value>) -> Result<Box<dyn Value>, DiffError>,
    ),
    DiffError,
>
where
    T: Clone + std::fmt::Debug + 'static,
    F: FnOnce(Traced<T>) -> Result<Traced<T>, DiffError>,
{
    let guard = TraceGuard::open();
    let trace = guard.id();
    let root = Node::root_vjp(trace);
    let boxed_input = Traced::Boxed(Boxed {
        value: input.clone(),
        node: root.clone(),
    });
    let end = f(boxed_input)?;
    drop(guard);

    match end.node() {
        Some(node) if node.trace == trace => {
            let end_node = node.clone();
            Ok((
                end.clone(),
                move |seed: Box<dyn Value>| backward_pass(seed, &end_node),
            ))
        }
        _ => {
            tracing::warn!("output independent of input; gradient is zero");
            Ok((end, move |_seed: Box<dyn Value>| {
                let vs = vspace(&input)?;
                Ok(vs.zeros())
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{downcast_ref, erase};
    use crate::vspace::install_builtin_vspaces;

    #[test]
    fn independent_output_yields_zero_gradient() {
        install_builtin_vspaces();
        let (_y, vjp) = make_vjp(|_x: Traced<f64>| Ok(Traced::from(5.0_f64)), 3.0_f64).unwrap();
        let g = vjp(erase(1.0_f64)).unwrap();
        assert_eq!(*downcast_ref::<f64>(g.as_ref()), 0.0);
    }
}
