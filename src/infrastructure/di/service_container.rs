//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::ModuleService;
use crate::application::{
    ConfigLoader, DirConfigLoader, FolderStorage, GetterRegistry, Storage,
};
use crate::config::Settings;
use crate::infrastructure::getters::default_registry;
use crate::infrastructure::traits::{CommandRunner, FileSystem, RealCommandRunner, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Command runner abstraction
    pub cmd: Arc<dyn CommandRunner>,

    /// Scheme → getter bindings shared by storage and `fetch`
    pub getters: Arc<GetterRegistry>,

    pub storage: Arc<dyn Storage>,
    pub loader: Arc<dyn ConfigLoader>,
    pub modules: ModuleService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let cmd: Arc<dyn CommandRunner> = Arc::new(RealCommandRunner);
        let getters = Arc::new(default_registry(fs.clone(), cmd.clone()));
        Self::with_deps(settings, fs, cmd, getters)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        getters: Arc<GetterRegistry>,
    ) -> Self {
        let settings = Arc::new(settings);
        let storage: Arc<dyn Storage> = Arc::new(FolderStorage::new(
            settings.storage_dir.clone(),
            fs.clone(),
            getters.clone(),
        ));
        let loader: Arc<dyn ConfigLoader> = Arc::new(DirConfigLoader::new(fs.clone()));
        let modules = ModuleService::new(
            fs.clone(),
            storage.clone(),
            loader.clone(),
            getters.clone(),
        );

        Self {
            settings,
            fs,
            cmd,
            getters,
            storage,
            loader,
            modules,
        }
    }
}
