/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while interpreting core data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A condition string could not be parsed.
    #[error("invalid condition: \"{0}\"")]
    InvalidCondition(String),

    /// An attribute name is not part of the attribute block.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
}
