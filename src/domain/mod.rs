//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod config;
pub mod entities;
pub mod error;
pub mod interpolation;
pub mod source;

pub use config::ModuleConfig;
pub use entities::*;
pub use error::DomainError;
pub use interpolation::InterpolatedVariable;
pub use source::{detect, split_forced_getter};
