use thiserror::Error;

use crate::job::JobStatus;

/// Domain-level failures shared across the workspace.
///
/// These map onto the caller-facing taxonomy: every variant here is an input
/// error reported synchronously, never retried.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid file type '.{0}'; allowed: csv, xlsx, xls")]
    InvalidFileType(String),

    #[error("file too large: {size} bytes (maximum {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("missing required mapping: {0}")]
    MissingMapping(&'static str),

    #[error("column '{header}' is mapped to both {first} and {second}")]
    DuplicateMapping {
        header: String,
        first: &'static str,
        second: &'static str,
    },

    /// Transition requested out of a terminal (or otherwise incompatible) state.
    #[error("job is {from}, cannot {action}")]
    IllegalTransition {
        from: JobStatus,
        action: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
