//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

/// Domain errors represent problems inside a single module configuration
/// or a single source string. They never involve the tree.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("parse {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("variable {0}: duplicated. variable names must be unique")]
    DuplicateVariable(String),

    #[error("output {0}: duplicated. output names must be unique")]
    DuplicateOutput(String),

    #[error("module {0}: duplicated. module names must be unique")]
    DuplicateModule(String),

    #[error("module {0}: missing source")]
    MissingSource(String),

    #[error("output {0}: missing value")]
    MissingOutputValue(String),

    #[error("{location}: unknown variable referenced: {name}")]
    UnknownVariable { location: String, name: String },

    #[error("{location}: unknown module referenced: {name}")]
    UnknownModule { location: String, name: String },

    #[error("invalid source string: {0}")]
    InvalidSource(String),
}
