//! CLI-level errors (wraps lower-layer errors)

use thiserror::Error;

use crate::application::{ApplicationError, LoaderError, TreeError};
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("{0}")]
    Usage(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use crate::exitcode;

        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Http { .. } => exitcode::UNAVAILABLE,
                _ => exitcode::SOFTWARE,
            },
            CliError::Application(e) => match e {
                ApplicationError::Domain(_) => exitcode::DATAERR,
                ApplicationError::Loader(LoaderError::Empty(_)) => exitcode::NOINPUT,
                ApplicationError::Loader(LoaderError::Read { .. }) => exitcode::IOERR,
                ApplicationError::Loader(LoaderError::Domain(_)) => exitcode::DATAERR,
                ApplicationError::Tree(TreeError::NotFound(_))
                | ApplicationError::Tree(TreeError::Storage { .. }) => exitcode::UNAVAILABLE,
                ApplicationError::Tree(_) => exitcode::DATAERR,
                ApplicationError::Fetch(_) => exitcode::UNAVAILABLE,
                ApplicationError::Config { .. } => exitcode::CONFIG,
                ApplicationError::OperationFailed { .. } => exitcode::IOERR,
            },
        }
    }
}
