//! Rule registry: a primitive registers its per-argnum VJP and
//! JVP makers here, keyed by a zero-sized marker type unique to that
//! primitive rather than by name — this sidesteps name collisions between
//! unrelated crates registering primitives called e.g. `add`.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::DiffError;
use crate::value::Value;

/// A primitive's raw (non-traced) forward function, erased over its
/// argument vector. Needed so `def_linear`'s `'same'` marker (see
/// [`JvpMaker::Same`]) can re-invoke the primitive with one argument slot
/// replaced by a tangent, exactly as `autograd.core.translate_jvp` does for
/// `'same'`.
pub(crate) type ForwardFn = Box<dyn Fn(&[Box<dyn Value>]) -> Box<dyn Value> + Send + Sync>;

/// `(ans, args, g) ↦ ingrad` for one argnum. Combines `autograd.core`'s two
/// curried steps (`vjpmaker(ans, args) -> (g -> ingrad)`) into one call —
/// Rust has no use for the intermediate closure since every call site here
/// already has `g` in hand by the time it needs an ingrad.
pub(crate) type VjpMaker =
    Box<dyn Fn(&dyn Value, &[Box<dyn Value>], &dyn Value) -> Box<dyn Value> + Send + Sync>;

/// Produces the tangent contribution of one argnum given that argument's
/// own tangent, the primitive's answer, and the original arguments.
pub(crate) type JvpFn =
    Box<dyn Fn(&dyn Value, &dyn Value, &[Box<dyn Value>]) -> Box<dyn Value> + Send + Sync>;

/// Mirrors `autograd.core.translate_jvp`'s three cases.
pub(crate) enum JvpMaker {
    /// An explicit per-argnum tangent-propagation function.
    Fn(JvpFn),
    /// `'same'`: the primitive is linear in this argument, so its JVP is
    /// itself — re-invoke the forward function with this argnum's argument
    /// replaced by the incoming tangent.
    Same,
    /// The primitive does not depend on this argument; JVP contributes zero.
    Zero,
}

#[derive(Default)]
struct Entry {
    vjps: HashMap<usize, VjpMaker>,
    jvps: HashMap<usize, JvpMaker>,
    forward: Option<ForwardFn>,
    arity: Option<usize>,
}

static REGISTRY: RwLock<Option<HashMap<TypeId, Entry>>> = RwLock::new(None);

fn with_entry<R>(primitive: TypeId, f: impl FnOnce(&mut Entry) -> R) -> R {
    let mut guard = REGISTRY.write().expect("rule registry poisoned");
    let map = guard.get_or_insert_with(HashMap::new);
    f(map.entry(primitive).or_default())
}

/// Registers `primitive`'s arity and raw forward function. Every primitive
/// that wants VJP/JVP rules checked for argnum range must call this first.
pub fn register_primitive<P: 'static>(arity: usize, forward: ForwardFn) {
    with_entry(TypeId::of::<P>(), |e| {
        e.arity = Some(arity);
        e.forward = Some(forward);
    });
}

fn check_argnum(primitive_name: &'static str, entry: &Entry, argnum: usize) -> Result<(), DiffError> {
    match entry.arity {
        Some(arity) if argnum >= arity => Err(DiffError::InvalidArgnum {
            primitive: primitive_name,
            argnum,
            arity,
        }),
        _ => Ok(()),
    }
}

/// `defvjp_argnums`: register one VJP maker per argnum in one call.
pub fn defvjp_argnums<P: 'static>(
    primitive_name: &'static str,
    makers: Vec<(usize, VjpMaker)>,
) -> Result<(), DiffError> {
    with_entry(TypeId::of::<P>(), |e| {
        for (argnum, maker) in makers {
            check_argnum(primitive_name, e, argnum)?;
            e.vjps.insert(argnum, maker);
        }
        Ok(())
    })
}

/// `defvjp_argnum`: register a single argnum's VJP maker.
pub fn defvjp_argnum<P: 'static>(
    primitive_name: &'static str,
    argnum: usize,
    maker: VjpMaker,
) -> Result<(), DiffError> {
    defvjp_argnums::<P>(primitive_name, vec![(argnum, maker)])
}

/// `defvjp`: the common case — one or more fixed argnums, in order,
/// starting at 0.
pub fn defvjp<P: 'static>(
    primitive_name: &'static str,
    makers: Vec<VjpMaker>,
) -> Result<(), DiffError> {
    defvjp_argnums::<P>(
        primitive_name,
        makers.into_iter().enumerate().collect(),
    )
}

/// `defjvp_argnums`.
pub fn defjvp_argnums<P: 'static>(
    primitive_name: &'static str,
    makers: Vec<(usize, JvpMaker)>,
) -> Result<(), DiffError> {
    with_entry(TypeId::of::<P>(), |e| {
        for (argnum, maker) in makers {
            check_argnum(primitive_name, e, argnum)?;
            e.jvps.insert(argnum, maker);
        }
        Ok(())
    })
}

/// `defjvp_argnum`.
pub fn defjvp_argnum<P: 'static>(
    primitive_name: &'static str,
    argnum: usize,
    maker: JvpMaker,
) -> Result<(), DiffError> {
    defjvp_argnums::<P>(primitive_name, vec![(argnum, maker)])
}

/// `defjvp`: fixed argnums starting at 0, in order.
pub fn defjvp<P: 'static>(
    primitive_name: &'static str,
    makers: Vec<JvpMaker>,
) -> Result<(), DiffError> {
    defjvp_argnums::<P>(
        primitive_name,
        makers.into_iter().enumerate().collect(),
    )
}

/// `def_linear`: the primitive is linear in every argument, so both its
/// VJP and its JVP follow mechanically. VJP for argnum `i`: `g ↦
/// primitive(..., g in slot i, ...)` with every other slot zeroed, covector
/// already applied by the caller. JVP for every argnum is `'same'`.
pub fn def_linear<P: 'static>(primitive_name: &'static str, arity: usize) -> Result<(), DiffError> {
    defjvp_argnums::<P>(
        primitive_name,
        (0..arity).map(|i| (i, JvpMaker::Same)).collect(),
    )
}

/// Invoke the registered VJP maker for `(primitive, argnum)`, producing the
/// ingrad-producing closure for this call site. Returns `RuleMissing` if no
/// maker was registered — discovered lazily at backward-pass time.
pub(crate) fn call_vjp_maker(
    primitive: TypeId,
    primitive_name: &'static str,
    argnum: usize,
    ans: &dyn Value,
    args: &[Box<dyn Value>],
    g: &dyn Value,
) -> Result<Box<dyn Value>, DiffError> {
    let guard = REGISTRY.read().expect("rule registry poisoned");
    let entry = guard.as_ref().and_then(|m| m.get(&primitive));
    let maker = entry.and_then(|e| e.vjps.get(&argnum));
    match maker {
        Some(maker) => Ok(maker(ans, args, g)),
        None => Err(DiffError::RuleMissing {
            primitive: primitive_name,
            argnum,
            mode: crate::error::Mode::Reverse,
        }),
    }
}

/// Invoke the registered JVP rule for `(primitive, argnum)` immediately
/// (forward mode computes tangents eagerly, so a missing rule surfaces at
/// trace time).
pub(crate) fn call_jvp(
    primitive: TypeId,
    primitive_name: &'static str,
    argnum: usize,
    tangent: &dyn Value,
    ans: &dyn Value,
    args: &[Box<dyn Value>],
) -> Result<Box<dyn Value>, DiffError> {
    let guard = REGISTRY.read().expect("rule registry poisoned");
    let entry = guard.as_ref().and_then(|m| m.get(&primitive));
    let maker = entry.and_then(|e| e.jvps.get(&argnum));
    match maker {
        Some(JvpMaker::Fn(f)) => Ok(f(tangent, ans, args)),
        Some(JvpMaker::Same) => {
            let forward = entry
                .and_then(|e| e.forward.as_ref())
                .unwrap_or_else(|| panic!("'same' jvp registered without a forward fn for {primitive_name}"));
            let mut substituted: Vec<Box<dyn Value>> = args.to_vec();
            substituted[argnum] = tangent.clone_value();
            Ok(forward(&substituted))
        }
        Some(JvpMaker::Zero) => {
            let vs = crate::vspace::vspace(ans)?;
            Ok(vs.zeros())
        }
        None => Err(DiffError::RuleMissing {
            primitive: primitive_name,
            argnum,
            mode: crate::error::Mode::Forward,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{downcast_ref, erase};

    struct AddPrim;

    #[test]
    fn registers_and_resolves_vjp() {
        register_primitive::<AddPrim>(
            2,
            Box::new(|args| erase(downcast_ref::<f64>(&args[0]) + downcast_ref::<f64>(&args[1]))),
        );
        defvjp::<AddPrim>(
            "add",
            vec![
                Box::new(|_ans, _args, g: &dyn Value| erase(*downcast_ref::<f64>(g))),
                Box::new(|_ans, _args, g: &dyn Value| erase(*downcast_ref::<f64>(g))),
            ],
        )
        .unwrap();
        let g = erase(5.0_f64);
        let out = call_vjp_maker(
            TypeId::of::<AddPrim>(),
            "add",
            0,
            &erase(0.0_f64) as &dyn Value,
            &[erase(1.0_f64), erase(2.0_f64)],
            g.as_ref(),
        )
        .unwrap();
        assert_eq!(*downcast_ref::<f64>(out.as_ref()), 5.0);
    }

    #[test]
    fn out_of_range_argnum_rejected() {
        struct UnaryPrim;
        register_primitive::<UnaryPrim>(1, Box::new(|args| args[0].clone_value()));
        let err = defvjp_argnum::<UnaryPrim>(
            "unary",
            3,
            Box::new(|_ans, _args, g: &dyn Value| g.clone_value()),
        );
        assert!(matches!(err, Err(DiffError::InvalidArgnum { .. })));
    }
}
