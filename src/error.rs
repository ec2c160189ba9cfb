//! Error taxonomy: rule-missing, type-unsupported,
//! differentiation-invalid, and the invalid-argnum registration error.
//! User exceptions are ordinary Rust panics/`Result`s from the traced
//! closure and are not represented here — they propagate unchanged.

use thiserror::Error;

/// Which engine was walking the graph when a rule turned out to be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Reverse,
    Forward,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Reverse => write!(f, "reverse"),
            Mode::Forward => write!(f, "forward"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("{mode} rule for `{primitive}` at argnum {argnum} is not registered")]
    RuleMissing {
        primitive: &'static str,
        argnum: usize,
        mode: Mode,
    },

    #[error(
        "no VSpace registered for type `{type_name}`; registered types are [{registered}]; register one with `register_vspace` before tracing"
    )]
    UnregisteredType {
        type_name: &'static str,
        registered: String,
    },

    #[error("`{primitive}` produced a value that cannot be extended differentiably: {reason}")]
    DifferentiationInvalid {
        primitive: &'static str,
        reason: String,
    },

    #[error("argnum {argnum} is out of range for `{primitive}` (arity {arity})")]
    InvalidArgnum {
        primitive: &'static str,
        argnum: usize,
        arity: usize,
    },
}
