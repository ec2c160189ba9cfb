//! Declarative registration macros: name a primitive once and get both its
//! traced entry point and its registry wiring, rather than hand-writing
//! that boilerplate per primitive. These wire a marker type into the
//! dynamic VJP/JVP registries.

/// Declares a unary primitive over a single value type: a marker struct, a
/// traced function, and an `install` function registering its forward
/// function and derivative rule.
macro_rules! primitive_unary {
    (
        marker = $marker:ident,
        name = $name:ident,
        display = $display:expr,
        ty = $ty:ty,
        forward = $forward:expr,
        vjp = $vjp:expr,
        jvp = $jvp:expr $(,)?
    ) => {
        pub struct $marker;

        pub fn $name(
            x: crate::boxed::Traced<$ty>,
        ) -> Result<crate::boxed::Traced<$ty>, crate::error::DiffError> {
            crate::tracer::apply_unary::<$ty, $marker>(x, $display, $forward)
        }

        impl $marker {
            pub(crate) fn install() -> Result<(), crate::error::DiffError> {
                crate::registry::register_primitive::<$marker>(
                    1,
                    Box::new(|args: &[Box<dyn crate::value::Value>]| {
                        let x = crate::value::downcast_ref::<$ty>(&args[0]);
                        crate::value::erase(($forward)(x))
                    }),
                );
                crate::registry::defvjp::<$marker>($display, vec![$vjp])?;
                crate::registry::defjvp::<$marker>($display, vec![$jvp])?;
                Ok(())
            }
        }
    };
}

/// Declares a binary primitive over a single value type (both operands and
/// the result share `$ty`).
macro_rules! primitive_binary {
    (
        marker = $marker:ident,
        name = $name:ident,
        display = $display:expr,
        ty = $ty:ty,
        forward = $forward:expr,
        vjp = [$vjp0:expr, $vjp1:expr],
        jvp = [$jvp0:expr, $jvp1:expr] $(,)?
    ) => {
        pub struct $marker;

        pub fn $name(
            a: crate::boxed::Traced<$ty>,
            b: crate::boxed::Traced<$ty>,
        ) -> Result<crate::boxed::Traced<$ty>, crate::error::DiffError> {
            crate::tracer::apply_binary::<$ty, $marker>(a, b, $display, $forward)
        }

        impl $marker {
            pub(crate) fn install() -> Result<(), crate::error::DiffError> {
                crate::registry::register_primitive::<$marker>(
                    2,
                    Box::new(|args: &[Box<dyn crate::value::Value>]| {
                        let a = crate::value::downcast_ref::<$ty>(&args[0]);
                        let b = crate::value::downcast_ref::<$ty>(&args[1]);
                        crate::value::erase(($forward)(a, b))
                    }),
                );
                crate::registry::defvjp::<$marker>($display, vec![$vjp0, $vjp1])?;
                crate::registry::defjvp::<$marker>($display, vec![$jvp0, $jvp1])?;
                Ok(())
            }
        }
    };
}

/// Declares a `notrace` primitive: a pass-through function that always
/// computes on raw values and never emits a Node, regardless of whether its
/// argument is boxed on an open trace. No registry wiring is needed — a
/// `notrace` primitive has no derivative rule to look up.
macro_rules! notrace_unary {
    (
        name = $name:ident,
        ty_in = $ty_in:ty,
        ty_out = $ty_out:ty,
        forward = $forward:expr $(,)?
    ) => {
        pub fn $name(x: crate::boxed::Traced<$ty_in>) -> crate::boxed::Traced<$ty_out> {
            crate::tracer::apply_notrace_unary::<$ty_in, $ty_out>(x, $forward)
        }
    };
}

pub(crate) use notrace_unary;
pub(crate) use primitive_binary;
pub(crate) use primitive_unary;
