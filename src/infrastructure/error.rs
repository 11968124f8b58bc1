//! Infrastructure-level errors: processes, HTTP, raw I/O.

use thiserror::Error;

/// Errors raised by getters and the external-process helper.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Program ran and exited with a non-zero status.
    #[error("{program} exited with {code}: {output}")]
    Exited {
        program: String,
        code: i32,
        output: String,
    },

    /// Program could not be started, or was terminated by a signal.
    #[error("error running {program}: {output}")]
    Failed { program: String, output: String },

    #[error("GET {url}: {message}")]
    Http { url: String, message: String },

    /// Destination exists but was not produced by this getter.
    #[error("{path}: {message}")]
    UnrecognizedDestination { path: String, message: String },

    #[error("{0}")]
    InvalidUrl(String),
}

impl InfraError {
    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type for infrastructure layer operations.
pub type InfraResult<T> = Result<T, InfraError>;
