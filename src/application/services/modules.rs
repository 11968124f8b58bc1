//! Module service
//!
//! Use cases on top of the tree: load a root module from a directory,
//! validate it, fetch a single source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::getter::GetterRegistry;
use crate::application::loader::ConfigLoader;
use crate::application::storage::Storage;
use crate::application::tree::{LoadOptions, ModuleTree};
use crate::application::error_ext::IoResultExt;
use crate::application::ApplicationResult;
use crate::domain::detect;
use crate::infrastructure::traits::FileSystem;

/// Service for resolving and validating module trees.
pub struct ModuleService {
    fs: Arc<dyn FileSystem>,
    storage: Arc<dyn Storage>,
    loader: Arc<dyn ConfigLoader>,
    getters: Arc<GetterRegistry>,
}

impl ModuleService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        storage: Arc<dyn Storage>,
        loader: Arc<dyn ConfigLoader>,
        getters: Arc<GetterRegistry>,
    ) -> Self {
        Self {
            fs,
            storage,
            loader,
            getters,
        }
    }

    /// Parse the root module in `dir` and load its whole tree.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, dir: &Path, opts: LoadOptions) -> ApplicationResult<ModuleTree> {
        let dir = self.canonical_dir(dir)?;
        let tree = ModuleTree::from_dir("", &dir, self.loader.as_ref())?;
        tree.load_with(self.storage.as_ref(), self.loader.as_ref(), opts)?;
        info!("loaded module tree from {} (depth {})", dir.display(), tree.depth());
        Ok(tree)
    }

    /// Load the tree in `dir` and run all semantic checks on it.
    #[instrument(level = "debug", skip(self))]
    pub fn validate(&self, dir: &Path, opts: LoadOptions) -> ApplicationResult<ModuleTree> {
        let tree = self.load(dir, opts)?;
        tree.validate()?;
        debug!("validate: ok");
        Ok(tree)
    }

    /// Download `source` into `dst`; local paths are resolved against `cwd`.
    #[instrument(level = "debug", skip(self))]
    pub fn fetch(&self, source: &str, dst: &Path, cwd: &Path) -> ApplicationResult<()> {
        let source = detect(source, cwd)?;
        self.getters.fetch(dst, &source)?;
        info!("fetched {} into {}", source, dst.display());
        Ok(())
    }

    fn canonical_dir(&self, dir: &Path) -> ApplicationResult<PathBuf> {
        if !self.fs.is_dir(dir) {
            return Err::<PathBuf, _>(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "not a directory",
            ))
            .with_path_context("module directory not found", dir);
        }
        self.fs.canonicalize(dir).with_path_context("canonicalize", dir)
    }
}
