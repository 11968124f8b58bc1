//! modtree: resolve, download and validate trees of configuration modules.
//!
//! A module is a directory of TOML files declaring variables, outputs and
//! references to other modules. Loading a root module recursively fetches
//! every referenced module into local storage; validation then checks
//! that each module only receives parameters it declares and only exposes
//! outputs that exist.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
