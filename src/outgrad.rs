//! Outgrad accumulation: gradients flowing backward into a Node with more
//! than one child must be summed as they arrive, in whatever
//! order the backward pass visits them, without paying for a zero-filled
//! dense buffer when only a small coordinate subset actually changed.
//!
//! Mirrors `autograd.core.add_outgrads`'s dense/sparse, mutable/immutable
//! branching, with the mutability flag modeled as an explicit state
//! (`Outgrad::Dense`'s `mutable` field) rather than a bare bool threaded
//! through tuples.

use std::sync::Arc;

use crate::error::DiffError;
use crate::value::Value;
use crate::vspace::{VSpace, vspace};

/// A gradient contribution that only touches part of a value's coordinates
/// (e.g. the result of indexing into an array). Primitives that produce
/// these avoid materializing a zero-filled buffer at the call site; the
/// accumulator materializes one lazily, the first time a sparse
/// contribution actually needs to be folded into a running sum.
pub struct SparseObject {
    vs: Arc<dyn VSpace>,
    contribution: Box<dyn Value>,
}

impl SparseObject {
    pub fn new(vs: Arc<dyn VSpace>, contribution: Box<dyn Value>) -> Self {
        SparseObject { vs, contribution }
    }
}

/// One ingrad arriving at a Node during the backward pass, or the running
/// sum of several.
pub(crate) enum Outgrad {
    Dense { value: Box<dyn Value>, mutable: bool },
    Sparse(SparseObject),
}

impl Outgrad {
    pub(crate) fn dense(value: Box<dyn Value>) -> Self {
        Outgrad::Dense { value, mutable: false }
    }
}

fn densify(s: SparseObject) -> Outgrad {
    let base = s.vs.zeros();
    let value = s.vs.mut_add(base, s.contribution.as_ref());
    Outgrad::Dense { value, mutable: true }
}

/// `add_outgrads(prev, g)`: fold a newly arrived contribution `g` into the
/// running accumulator `prev` (absent on the first contribution to a Node).
pub(crate) fn add_outgrads(prev: Option<Outgrad>, g: Outgrad) -> Result<Outgrad, DiffError> {
    match prev {
        None => match g {
            Outgrad::Sparse(s) => Ok(densify(s)),
            Outgrad::Dense { value, .. } => Ok(Outgrad::Dense { value, mutable: false }),
        },
        Some(Outgrad::Sparse(prev_s)) => add_outgrads(Some(densify(prev_s)), g),
        Some(Outgrad::Dense { value, mutable }) => match g {
            Outgrad::Sparse(s) => {
                let base = if mutable {
                    value
                } else {
                    let vs = vspace(value.as_ref())?;
                    vs.mut_add(vs.zeros(), value.as_ref())
                };
                let sum = s.vs.mut_add(base, s.contribution.as_ref());
                Ok(Outgrad::Dense { value: sum, mutable: true })
            }
            Outgrad::Dense { value: gv, .. } => {
                let vs = vspace(value.as_ref())?;
                let sum = if mutable {
                    vs.mut_add(value, gv.as_ref())
                } else {
                    vs.add(value.as_ref(), gv.as_ref())
                };
                Ok(Outgrad::Dense { value: sum, mutable: true })
            }
        },
    }
}

/// Collapse an `Outgrad` (dense or sparse) down to a plain value, for
/// handing to a VJP closure or returning as a final gradient.
pub(crate) fn materialize(o: Outgrad) -> Box<dyn Value> {
    match o {
        Outgrad::Dense { value, .. } => value,
        Outgrad::Sparse(s) => {
            let base = s.vs.zeros();
            s.vs.mut_add(base, s.contribution.as_ref())
        }
    }
}

/// `sum_outgrads`: fold a fixed collection of contributions arriving at the
/// same Node in one backward-pass step: each Node's parents are visited
/// once, all at once, so multiple ingrads for the same parent in one step
/// are summed before insertion into the running map.
pub(crate) fn sum_outgrads(
    gs: impl IntoIterator<Item = Outgrad>,
) -> Result<Option<Box<dyn Value>>, DiffError> {
    let mut acc: Option<Outgrad> = None;
    for g in gs {
        acc = Some(add_outgrads(acc, g)?);
    }
    Ok(acc.map(materialize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{downcast_ref, erase};
    use crate::vspace::install_builtin_vspaces;

    #[test]
    fn first_contribution_is_immutable() {
        let g = Outgrad::dense(erase(3.0_f64));
        let acc = add_outgrads(None, g).unwrap();
        match acc {
            Outgrad::Dense { value, mutable } => {
                assert_eq!(*downcast_ref::<f64>(value.as_ref()), 3.0);
                assert!(!mutable);
            }
            _ => panic!("expected dense"),
        }
    }

    #[test]
    fn second_contribution_sums_and_becomes_mutable() {
        install_builtin_vspaces();
        let acc = add_outgrads(None, Outgrad::dense(erase(3.0_f64))).unwrap();
        let acc = add_outgrads(Some(acc), Outgrad::dense(erase(4.0_f64))).unwrap();
        match acc {
            Outgrad::Dense { value, mutable } => {
                assert_eq!(*downcast_ref::<f64>(value.as_ref()), 7.0);
                assert!(mutable);
            }
            _ => panic!("expected dense"),
        }
    }

    #[test]
    fn sum_outgrads_of_many() {
        install_builtin_vspaces();
        let gs = vec![
            Outgrad::dense(erase(1.0_f64)),
            Outgrad::dense(erase(2.0_f64)),
            Outgrad::dense(erase(3.0_f64)),
        ];
        let total = sum_outgrads(gs).unwrap().unwrap();
        assert_eq!(*downcast_ref::<f64>(total.as_ref()), 6.0);
    }
}
