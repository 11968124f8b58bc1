//! Loading module configurations from directories.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::error::LoaderError;
use crate::domain::ModuleConfig;
use crate::infrastructure::traits::FileSystem;

/// Parses the configuration stored in a module directory.
pub trait ConfigLoader: Send + Sync {
    fn load_dir(&self, dir: &Path) -> Result<ModuleConfig, LoaderError>;
}

/// Reads every `*.toml` file directly inside a directory and merges them
/// in file name order.
pub struct DirConfigLoader {
    fs: Arc<dyn FileSystem>,
}

impl DirConfigLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl ConfigLoader for DirConfigLoader {
    #[instrument(level = "debug", skip(self))]
    fn load_dir(&self, dir: &Path) -> Result<ModuleConfig, LoaderError> {
        // modules fetched as symlinks resolve their relative sources
        // against the real location
        let dir = self.fs.canonicalize(dir).map_err(|e| LoaderError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let dir = dir.as_path();

        let entries = self.fs.read_dir(dir).map_err(|e| LoaderError::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut config = ModuleConfig::new(dir);
        let mut found = 0usize;
        for path in entries {
            let is_toml = path.extension().map(|ext| ext == "toml").unwrap_or(false);
            if !is_toml || self.fs.is_dir(&path) {
                continue;
            }

            let content = self.fs.read_to_string(&path).map_err(|e| LoaderError::Read {
                path: path.clone(),
                source: e,
            })?;
            config.merge(ModuleConfig::parse(&content, &path)?);
            found += 1;
        }

        if found == 0 {
            return Err(LoaderError::Empty(dir.to_path_buf()));
        }
        debug!("load_dir: {} files, {} modules", found, config.modules.len());
        Ok(config)
    }
}
