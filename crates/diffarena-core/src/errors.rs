use thiserror::Error;

/// Failures outside the parse itself.
///
/// Parsing diff content never fails; malformed input is reported through
/// diagnostics on the parse result.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parse options: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DiffError>;
