//! `file://` sources: link the module directory into storage.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::application::{BoxError, Getter};
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::InfraError;

/// Makes `dst` a symlink to a local module directory, so edits to the
/// module are picked up without re-fetching.
pub struct FileGetter {
    fs: Arc<dyn FileSystem>,
}

impl FileGetter {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Getter for FileGetter {
    fn get(&self, dst: &Path, url: &Url) -> Result<(), BoxError> {
        let src = url
            .to_file_path()
            .map_err(|_| InfraError::InvalidUrl(format!("not a local path: {url}")))?;

        if !self.fs.exists(&src) {
            return Err(InfraError::io(
                format!("source path error: {}", src.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
            )
            .into());
        }
        if !self.fs.is_dir(&src) {
            return Err(InfraError::UnrecognizedDestination {
                path: src.display().to_string(),
                message: "source path must be a directory".into(),
            }
            .into());
        }

        // Only a link we created earlier may be replaced.
        if self.fs.is_symlink(dst) {
            self.fs
                .remove_file(dst)
                .map_err(|e| InfraError::io(format!("remove {}", dst.display()), e))?;
        } else if self.fs.exists(dst) {
            return Err(InfraError::UnrecognizedDestination {
                path: dst.display().to_string(),
                message: "destination exists and is not a symlink".into(),
            }
            .into());
        }

        self.fs
            .ensure_parent(dst)
            .map_err(|e| InfraError::io(format!("create parent of {}", dst.display()), e))?;
        self.fs
            .symlink_dir(&src, dst)
            .map_err(|e| InfraError::io(format!("symlink {}", dst.display()), e))?;
        debug!("linked {} -> {}", dst.display(), src.display());
        Ok(())
    }
}
