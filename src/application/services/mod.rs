//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, Storage, ConfigLoader)
//! but are themselves concrete structs, not traits.

mod modules;

pub use modules::ModuleService;
