//! Application layer: module tree, storage, loading and getter dispatch
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod getter;
pub mod loader;
pub mod services;
pub mod storage;
pub mod tree;

pub use error::{
    ApplicationError, ApplicationResult, BoxError, ContractError, FetchError, LoaderError,
    PathError, StorageError, TreeError, TreeResult,
};
pub use error_ext::IoResultExt;
pub use getter::{fetch, Getter, GetterRegistry};
pub use loader::{ConfigLoader, DirConfigLoader};
pub use storage::{FolderStorage, Storage};
pub use tree::{Children, LoadOptions, ModuleTree, ROOT_NAME};
