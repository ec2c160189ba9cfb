//! The primitive call discipline: every traced primitive
//! funnels through [`apply_unary`] or [`apply_binary`], which
//!
//! 1. compute the raw answer by calling straight through to the untraced
//!    forward function,
//! 2. decide whether any argument is boxed on the outermost currently-open
//!    trace (if not, the call is untraced — return the raw answer),
//! 3. build this primitive's Node, wiring in the registered VJP or JVP
//!    rule depending on which mode that trace is running, and
//! 4. return a fresh `Boxed` pairing the answer with that Node.
//!
//! Individual primitives (`src/ops/*.rs`) are thin wrappers that provide a
//! marker type, a name, and a forward function to these two entry points.

use std::any::TypeId;
use std::fmt::Debug;

use crate::boxed::{Boxed, Traced};
use crate::error::DiffError;
use crate::node::Node;
use crate::registry;
use crate::trace::{is_open, outermost_open};
use crate::value::{Value, erase};

/// Convenience entry point for primitives whose output is the same value
/// type as their input (the common case). `P` is a zero-sized marker type
/// unique to the calling primitive, used as the rule registry's key in
/// place of a name.
pub(crate) fn apply_unary<T, P>(
    x: Traced<T>,
    primitive_name: &'static str,
    forward: impl Fn(&T) -> T,
) -> Result<Traced<T>, DiffError>
where
    T: Clone + Debug + 'static,
    P: 'static,
{
    apply_unary_het::<T, T, P>(x, primitive_name, forward)
}

/// General form of [`apply_unary`] for primitives that change value type,
/// e.g. reducing an array to a scalar.
pub(crate) fn apply_unary_het<In, Out, P>(
    x: Traced<In>,
    primitive_name: &'static str,
    forward: impl Fn(&In) -> Out,
) -> Result<Traced<Out>, DiffError>
where
    In: Clone + Debug + 'static,
    Out: Clone + Debug + 'static,
    P: 'static,
{
    let node = match x.node() {
        Some(node) if is_open(node.trace) => node.clone(),
        _ => return Ok(Traced::Raw(forward(&x.get_val()))),
    };

    let xv = x.get_val();
    let ans = forward(&xv);
    let primitive = TypeId::of::<P>();
    let args: Vec<Box<dyn Value>> = vec![erase(xv)];
    let trace = node.trace;

    let new_node = if node.is_reverse() {
        let ans_erased = erase(ans.clone());
        Node::interior_vjp(
            trace,
            vec![node],
            Box::new(move |g: &dyn Value| {
                let ingrad =
                    registry::call_vjp_maker(primitive, primitive_name, 0, ans_erased.as_ref(), &args, g)?;
                Ok(vec![ingrad])
            }),
        )
    } else {
        let tangent = node.tangent().clone_value();
        let ans_erased = erase(ans.clone());
        let tangent_out = registry::call_jvp(
            primitive,
            primitive_name,
            0,
            tangent.as_ref(),
            ans_erased.as_ref(),
            &args,
        )?;
        Node::interior_jvp(trace, vec![node], tangent_out)
    };

    Ok(Traced::Boxed(Boxed { value: ans, node: new_node }))
}

/// A `notrace` primitive: short-circuits the usual call discipline
/// unconditionally and always returns a raw value, regardless of whether
/// `x` is boxed on an open trace. Used for primitives that must not be
/// differentiated through (their output has no useful derivative, e.g. a
/// shape query or a cast), matching the primitive-call discipline's step 1
/// for nontraceable primitives.
pub(crate) fn apply_notrace_unary<In, Out>(x: Traced<In>, forward: impl Fn(&In) -> Out) -> Traced<Out>
where
    In: Clone + Debug + 'static,
    Out: Clone + Debug + 'static,
{
    Traced::Raw(forward(&x.get_val()))
}

/// Same discipline as [`apply_unary`], generalized to two argument
/// positions that may independently be raw, boxed on an inactive trace, or
/// boxed on the winning trace.
pub(crate) fn apply_binary<T, P>(
    a: Traced<T>,
    b: Traced<T>,
    primitive_name: &'static str,
    forward: impl Fn(&T, &T) -> T,
) -> Result<Traced<T>, DiffError>
where
    T: Clone + Debug + 'static,
    P: 'static,
{
    let candidates: Vec<_> = [a.node().map(|n| n.trace), b.node().map(|n| n.trace)]
        .into_iter()
        .flatten()
        .collect();

    let av = a.get_val();
    let bv = b.get_val();
    let ans = forward(&av, &bv);

    let Some(winning) = outermost_open(&candidates) else {
        return Ok(Traced::Raw(ans));
    };

    let a_parent = a.node().filter(|n| n.trace == winning).cloned();
    let b_parent = b.node().filter(|n| n.trace == winning).cloned();

    if a_parent.is_none() && b_parent.is_none() {
        return Ok(Traced::Raw(ans));
    }

    let primitive = TypeId::of::<P>();
    let args: Vec<Box<dyn Value>> = vec![erase(av), erase(bv)];

    let mut parents = Vec::new();
    let mut argnums = Vec::new();
    if let Some(n) = a_parent {
        parents.push(n);
        argnums.push(0usize);
    }
    if let Some(n) = b_parent {
        parents.push(n);
        argnums.push(1usize);
    }
    let reverse_mode = parents[0].is_reverse();

    let new_node = if reverse_mode {
        let ans_erased = erase(ans.clone());
        Node::interior_vjp(
            winning,
            parents,
            Box::new(move |g: &dyn Value| {
                argnums
                    .iter()
                    .map(|&argnum| {
                        registry::call_vjp_maker(primitive, primitive_name, argnum, ans_erased.as_ref(), &args, g)
                    })
                    .collect()
            }),
        )
    } else {
        let ans_erased = erase(ans.clone());
        let mut contributions = Vec::with_capacity(parents.len());
        for (parent, &argnum) in parents.iter().zip(argnums.iter()) {
            let tangent = parent.tangent();
            let contribution = registry::call_jvp(
                primitive,
                primitive_name,
                argnum,
                tangent,
                ans_erased.as_ref(),
                &args,
            )?;
            contributions.push(crate::outgrad::Outgrad::dense(contribution));
        }
        let total = crate::outgrad::sum_outgrads(contributions)?.expect("at least one active parent");
        Node::interior_jvp(winning, parents, total)
    };

    Ok(Traced::Boxed(Boxed { value: ans, node: new_node }))
}
