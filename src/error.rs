//! Crate-wide error type.

/// Errors surfaced by solver construction and stepping
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("there must be at least one reaction matrix")]
    NoReactions,

    #[error("reaction matrix shapes must all agree: found {0} and {1}")]
    ShapeMismatch(usize, usize),

    #[error("non-zero state enumeration offset unsupported")]
    NonZeroOffset,

    #[error("invalid time dependency: {0}")]
    TimeDependency(String),

    #[error("propensity function {reaction} returned a bad value {value} at state {state:?}")]
    BadPropensity {
        reaction: usize,
        value: f64,
        state: Vec<i32>,
    },

    #[error("support of the initial distribution is not a subset of the domain")]
    InitialSupport,

    #[error("solver packing misconfigured: {0}")]
    Packing(String),

    #[error("cannot step backwards to t = {requested} from current solution time {current}")]
    TimeReversal { requested: f64, current: f64 },

    #[error("ODE integration failure: {0}")]
    Integration(String),

    #[error("domain expansion failed: {0}")]
    Expansion(String),
}

pub type Result<T> = std::result::Result<T, Error>;
