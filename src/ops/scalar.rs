//! Demonstration primitives over bare `f64` scalars.

use crate::registry::JvpMaker;
use crate::value::{Value, downcast_ref, erase};

use super::macros::{primitive_binary, primitive_unary};

primitive_binary! {
    marker = Add,
    name = add,
    display = "add",
    ty = f64,
    forward = |a: &f64, b: &f64| a + b,
    vjp = [
        Box::new(|_ans, _args, g: &dyn Value| erase(*downcast_ref::<f64>(g))),
        Box::new(|_ans, _args, g: &dyn Value| erase(*downcast_ref::<f64>(g))),
    ],
    jvp = [JvpMaker::Same, JvpMaker::Same],
}

primitive_binary! {
    marker = Sub,
    name = sub,
    display = "sub",
    ty = f64,
    forward = |a: &f64, b: &f64| a - b,
    vjp = [
        Box::new(|_ans, _args, g: &dyn Value| erase(*downcast_ref::<f64>(g))),
        Box::new(|_ans, _args, g: &dyn Value| erase(-*downcast_ref::<f64>(g))),
    ],
    jvp = [
        JvpMaker::Fn(Box::new(|tangent, _ans, _args| erase(*downcast_ref::<f64>(tangent)))),
        JvpMaker::Fn(Box::new(|tangent, _ans, _args| erase(-*downcast_ref::<f64>(tangent)))),
    ],
}

primitive_binary! {
    marker = Mul,
    name = mul,
    display = "mul",
    ty = f64,
    forward = |a: &f64, b: &f64| a * b,
    vjp = [
        Box::new(|_ans, args: &[Box<dyn Value>], g: &dyn Value| {
            erase(downcast_ref::<f64>(g) * downcast_ref::<f64>(&args[1]))
        }),
        Box::new(|_ans, args: &[Box<dyn Value>], g: &dyn Value| {
            erase(downcast_ref::<f64>(g) * downcast_ref::<f64>(&args[0]))
        }),
    ],
    // Multiplication is linear in each argument with the other held at its
    // traced value, so re-invoking `mul` with one slot replaced by the
    // tangent already is the correct directional derivative.
    jvp = [JvpMaker::Same, JvpMaker::Same],
}

primitive_binary! {
    marker = Div,
    name = div,
    display = "div",
    ty = f64,
    forward = |a: &f64, b: &f64| a / b,
    vjp = [
        Box::new(|_ans, args: &[Box<dyn Value>], g: &dyn Value| {
            erase(downcast_ref::<f64>(g) / downcast_ref::<f64>(&args[1]))
        }),
        Box::new(|_ans, args: &[Box<dyn Value>], g: &dyn Value| {
            let x = downcast_ref::<f64>(&args[0]);
            let y = downcast_ref::<f64>(&args[1]);
            erase(-downcast_ref::<f64>(g) * x / (y * y))
        }),
    ],
    jvp = [
        // div(g, y) = g / y is exactly right when y is held fixed.
        JvpMaker::Same,
        JvpMaker::Fn(Box::new(|tangent, _ans, args: &[Box<dyn Value>]| {
            let x = downcast_ref::<f64>(&args[0]);
            let y = downcast_ref::<f64>(&args[1]);
            erase(-x * downcast_ref::<f64>(tangent) / (y * y))
        })),
    ],
}

primitive_unary! {
    marker = Neg,
    name = neg,
    display = "neg",
    ty = f64,
    forward = |x: &f64| -x,
    vjp = Box::new(|_ans, _args, g: &dyn Value| erase(-*downcast_ref::<f64>(g))),
    jvp = JvpMaker::Same,
}

primitive_unary! {
    marker = Exp,
    name = exp,
    display = "exp",
    ty = f64,
    forward = |x: &f64| x.exp(),
    vjp = Box::new(|ans, _args, g: &dyn Value| erase(downcast_ref::<f64>(g) * downcast_ref::<f64>(ans))),
    jvp = JvpMaker::Fn(Box::new(|tangent, ans, _args| {
        erase(downcast_ref::<f64>(tangent) * downcast_ref::<f64>(ans))
    })),
}

primitive_unary! {
    marker = Log,
    name = log,
    display = "log",
    ty = f64,
    forward = |x: &f64| x.ln(),
    vjp = Box::new(|_ans, args: &[Box<dyn Value>], g: &dyn Value| {
        erase(downcast_ref::<f64>(g) / downcast_ref::<f64>(&args[0]))
    }),
    jvp = JvpMaker::Fn(Box::new(|tangent, _ans, args: &[Box<dyn Value>]| {
        erase(downcast_ref::<f64>(tangent) / downcast_ref::<f64>(&args[0]))
    })),
}

pub(crate) fn install_all() -> Result<(), crate::error::DiffError> {
    Add::install()?;
    Sub::install()?;
    Mul::install()?;
    Div::install()?;
    Neg::install()?;
    Exp::install()?;
    Log::install()?;
    Ok(())
}
