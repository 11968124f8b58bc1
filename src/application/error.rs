//! Application-level errors (wrap domain errors)

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::DomainError;

/// Opaque cause carried by path errors and getter failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors of source getter dispatch.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid source '{src}': {source}")]
    InvalidLocator {
        src: String,
        #[source]
        source: url::ParseError,
    },

    #[error("module download not supported for scheme '{0}'")]
    UnsupportedScheme(String),

    /// A getter failed; `src` is the source as given, forced getter included.
    #[error("error downloading module '{src}': {source}")]
    Download {
        src: String,
        #[source]
        source: BoxError,
    },
}

/// Errors of a storage collaborator.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("storage: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors of a configuration loader.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("no configuration files found in {0}")]
    Empty(PathBuf),

    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Violations of the contract between a module and the module using it.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("module {module}: {key} is not a valid parameter")]
    InvalidParameter { module: String, key: String },

    #[error("{location}: {field} is not a valid output for module {module}")]
    InvalidOutput {
        location: String,
        field: String,
        module: String,
    },
}

/// A validation failure annotated with the modules it passed through.
///
/// `names` starts at the module where the failure happened and grows
/// toward the root as the error propagates upward.
#[derive(Debug)]
pub struct PathError {
    pub names: Vec<String>,
    pub cause: BoxError,
}

impl PathError {
    pub fn new(name: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            names: vec![name.into()],
            cause: cause.into(),
        }
    }

    /// Record that the error passed through module `name`.
    pub fn push(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {}: {}", self.names.join("."), self.cause)
    }
}

impl std::error::Error for PathError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Errors of loading and validating a module tree.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("module {0}: duplicated. module names must be unique")]
    DuplicateModule(String),

    #[error("module {name}: {source}")]
    InvalidSource {
        name: String,
        #[source]
        source: DomainError,
    },

    #[error("module {name}: {source}")]
    Storage {
        name: String,
        #[source]
        source: StorageError,
    },

    #[error("module {0}: not found, may need to be downloaded")]
    NotFound(String),

    #[error("module {name}: {source}")]
    Config {
        name: String,
        #[source]
        source: LoaderError,
    },

    #[error("tree must be loaded before calling validate")]
    NotLoaded,

    /// A module reference has no loaded child; load guarantees this
    /// never happens for a tree it built.
    #[error("module not found in children: {0}")]
    MissingChild(String),

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Application errors wrap lower-level errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: BoxError,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
