//! Demonstration primitives over dense `f64` tensors (`ndarray::ArrayD<f64>`).

use ndarray::ArrayD;

use crate::boxed::Traced;
use crate::error::DiffError;
use crate::registry::{self, JvpMaker};
use crate::tracer::apply_unary_het;
use crate::value::{Value, downcast_ref, erase};

use super::macros::{notrace_unary, primitive_binary, primitive_unary};

primitive_binary! {
    marker = ArrayAdd,
    name = array_add,
    display = "array_add",
    ty = ArrayD<f64>,
    forward = |a: &ArrayD<f64>, b: &ArrayD<f64>| a + b,
    vjp = [
        Box::new(|_ans, _args, g: &dyn Value| erase(downcast_ref::<ArrayD<f64>>(g).clone())),
        Box::new(|_ans, _args, g: &dyn Value| erase(downcast_ref::<ArrayD<f64>>(g).clone())),
    ],
    jvp = [JvpMaker::Same, JvpMaker::Same],
}

primitive_binary! {
    marker = ArraySub,
    name = array_sub,
    display = "array_sub",
    ty = ArrayD<f64>,
    forward = |a: &ArrayD<f64>, b: &ArrayD<f64>| a - b,
    vjp = [
        Box::new(|_ans, _args, g: &dyn Value| erase(downcast_ref::<ArrayD<f64>>(g).clone())),
        Box::new(|_ans, _args, g: &dyn Value| erase(-downcast_ref::<ArrayD<f64>>(g))),
    ],
    jvp = [
        JvpMaker::Fn(Box::new(|tangent, _ans, _args| erase(downcast_ref::<ArrayD<f64>>(tangent).clone()))),
        JvpMaker::Fn(Box::new(|tangent, _ans, _args| erase(-downcast_ref::<ArrayD<f64>>(tangent)))),
    ],
}

primitive_binary! {
    marker = ArrayMul,
    name = array_mul,
    display = "array_mul",
    ty = ArrayD<f64>,
    forward = |a: &ArrayD<f64>, b: &ArrayD<f64>| a * b,
    vjp = [
        Box::new(|_ans, args: &[Box<dyn Value>], g: &dyn Value| {
            erase(downcast_ref::<ArrayD<f64>>(g) * downcast_ref::<ArrayD<f64>>(&args[1]))
        }),
        Box::new(|_ans, args: &[Box<dyn Value>], g: &dyn Value| {
            erase(downcast_ref::<ArrayD<f64>>(g) * downcast_ref::<ArrayD<f64>>(&args[0]))
        }),
    ],
    jvp = [JvpMaker::Same, JvpMaker::Same],
}

primitive_unary! {
    marker = ArrayNeg,
    name = array_neg,
    display = "array_neg",
    ty = ArrayD<f64>,
    forward = |x: &ArrayD<f64>| -x,
    vjp = Box::new(|_ans, _args, g: &dyn Value| erase(-downcast_ref::<ArrayD<f64>>(g))),
    jvp = JvpMaker::Same,
}

notrace_unary! {
    name = shape,
    ty_in = ArrayD<f64>,
    ty_out = Vec<usize>,
    forward = |a: &ArrayD<f64>| a.shape().to_vec(),
}

/// Marker for `sum`, a reduction from `ArrayD<f64>` to `f64` — registered by
/// hand rather than through the unary macro, since the macro assumes the
/// input and output share one value type.
pub struct Sum;

pub fn sum(x: Traced<ArrayD<f64>>) -> Result<Traced<f64>, DiffError> {
    apply_unary_het::<ArrayD<f64>, f64, Sum>(x, "sum", |a| a.sum())
}

impl Sum {
    fn install() -> Result<(), DiffError> {
        registry::register_primitive::<Sum>(
            1,
            Box::new(|args: &[Box<dyn Value>]| {
                let a = downcast_ref::<ArrayD<f64>>(&args[0]);
                erase(a.sum())
            }),
        );
        registry::defvjp::<Sum>(
            "sum",
            vec![Box::new(|_ans, args: &[Box<dyn Value>], g: &dyn Value| {
                let x = downcast_ref::<ArrayD<f64>>(&args[0]);
                let g = *downcast_ref::<f64>(g);
                erase(ArrayD::<f64>::from_elem(x.raw_dim(), g))
            })],
        )?;
        registry::defjvp::<Sum>(
            "sum",
            vec![JvpMaker::Fn(Box::new(|tangent, _ans, _args| {
                erase(downcast_ref::<ArrayD<f64>>(tangent).sum())
            }))],
        )?;
        Ok(())
    }
}

pub(crate) fn install_all() -> Result<(), DiffError> {
    ArrayAdd::install()?;
    ArraySub::install()?;
    ArrayMul::install()?;
    ArrayNeg::install()?;
    Sum::install()?;
    Ok(())
}
