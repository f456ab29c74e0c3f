use thiserror::Error;

pub type IcResult<T> = Result<T, IcError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IcError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{what} '{name}' not found")]
    NotFound { what: &'static str, name: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
