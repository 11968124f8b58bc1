//! Where fetched modules live on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use crate::application::error::StorageError;
use crate::application::getter::GetterRegistry;
use crate::infrastructure::traits::FileSystem;

/// Materializes modules locally and tells the tree where they are.
pub trait Storage: Send + Sync {
    /// Make sure the module at `source` exists locally. With `update`
    /// set, refresh it even if it is already present.
    fn resolve_or_fetch(&self, source: &str, update: bool) -> Result<(), StorageError>;

    /// Local directory of an already-resolved `source`, `None` if it has
    /// not been fetched.
    fn locate_local(&self, source: &str) -> Result<Option<PathBuf>, StorageError>;
}

/// Stores every module in its own directory below `root`, named by the
/// SHA-256 of its source string.
pub struct FolderStorage {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    getters: Arc<GetterRegistry>,
}

impl FolderStorage {
    pub fn new(
        root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        getters: Arc<GetterRegistry>,
    ) -> Self {
        Self {
            root: root.into(),
            fs,
            getters,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a source is stored in, whether or not it exists yet.
    pub fn dir_for(&self, source: &str) -> PathBuf {
        self.root.join(hex::encode(Sha256::digest(source.as_bytes())))
    }
}

impl Storage for FolderStorage {
    #[instrument(level = "debug", skip(self))]
    fn resolve_or_fetch(&self, source: &str, update: bool) -> Result<(), StorageError> {
        if !update && self.locate_local(source)?.is_some() {
            debug!("resolve_or_fetch: {} already present", source);
            return Ok(());
        }

        self.fs
            .create_dir_all(&self.root)
            .map_err(|e| StorageError::Io {
                context: format!("create {}", self.root.display()),
                source: e,
            })?;

        let dst = self.dir_for(source);
        debug!("resolve_or_fetch: fetching {} into {}", source, dst.display());
        self.getters.fetch(&dst, source)?;
        Ok(())
    }

    fn locate_local(&self, source: &str) -> Result<Option<PathBuf>, StorageError> {
        let dir = self.dir_for(source);
        if !self.fs.exists(&dir) {
            return Ok(None);
        }
        if !self.fs.is_dir(&dir) {
            return Err(StorageError::Io {
                context: format!("{} is not a directory", dir.display()),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, "not a directory"),
            });
        }
        Ok(Some(dir))
    }
}
