//! Error types for the mechanics layer.

/// Errors that can occur while parsing or rolling dice.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MechError {
    /// The dice specification is not of the form `<count>d<sides>`.
    #[error("invalid dice notation: \"{0}\"")]
    InvalidDiceNotation(String),

    /// Modifier bounds with `min > max`.
    #[error("invalid modifier bounds: [{min}, {max}]")]
    InvalidBounds {
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },
}

/// Convenience result type for mechanics operations.
pub type MechResult<T> = Result<T, MechError>;
