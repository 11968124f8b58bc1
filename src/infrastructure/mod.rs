//! Infrastructure layer: I/O implementations, getters and DI container
//!
//! This layer implements I/O boundary traits and wires up services.

pub mod di;
pub mod error;
pub mod getters;
pub mod process;
pub mod traits;

pub use error::{InfraError, InfraResult};
