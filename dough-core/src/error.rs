use thiserror::Error;

pub type Result<T> = std::result::Result<T, DoughError>;

/// Failures when turning user-supplied names into typed values.
///
/// Numeric form values never fail: they are coerced (see [`crate::inputs`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DoughError {
    #[error("unknown yeast type: {0} (expected instant_dry or fresh)")]
    UnknownYeast(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("unknown checkbox: {0}")]
    UnknownCheckbox(String),

    #[error("invalid step route: {0}")]
    InvalidRoute(String),
}
