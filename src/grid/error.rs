use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("Coordinate axis '{0}' is empty")]
    EmptyAxis(&'static str),

    #[error("Coordinate axis '{0}' contains non-finite values")]
    NonFiniteAxis(&'static str),

    #[error("Coordinate axis '{0}' is not strictly monotonic")]
    NonMonotonicAxis(&'static str),

    #[error("Grid data has {found} cells, expected {expected}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("Expected {expected} monthly layers, found {found}")]
    LayerCount { expected: usize, found: usize },

    #[error("Month value {0} is outside 1..=12")]
    InvalidMonth(i64),
}
