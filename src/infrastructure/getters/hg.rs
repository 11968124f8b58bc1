//! Mercurial sources, driven through the `hg` command line.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::application::{BoxError, Getter};
use crate::infrastructure::getters::take_query_param;
use crate::infrastructure::process::run_command;
use crate::infrastructure::traits::{CommandRunner, FileSystem};
use crate::infrastructure::InfraError;

/// Clones or pulls a Mercurial repository, then updates the working copy
/// to the `rev` query parameter (or the tip).
pub struct HgGetter {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
}

impl HgGetter {
    pub fn new(fs: Arc<dyn FileSystem>, cmd: Arc<dyn CommandRunner>) -> Self {
        Self { fs, cmd }
    }

    fn hg(&self, args: &[&str]) -> Result<(), InfraError> {
        run_command(self.cmd.as_ref(), "hg", args)
    }
}

impl Getter for HgGetter {
    fn get(&self, dst: &Path, url: &Url) -> Result<(), BoxError> {
        let (url, rev) = take_query_param(url, "rev");
        let dst_owned = dst.to_string_lossy().into_owned();
        let dst_str = dst_owned.as_str();

        if self.fs.exists(dst) {
            if !self.fs.exists(&dst.join(".hg")) {
                return Err(InfraError::UnrecognizedDestination {
                    path: dst_owned.clone(),
                    message: "destination exists and is not a mercurial repository".into(),
                }
                .into());
            }
            debug!("hg: pulling into {}", dst_str);
            self.hg(&["pull", "-R", dst_str])?;
        } else {
            debug!("hg: cloning {} into {}", url, dst_str);
            self.fs
                .ensure_parent(dst)
                .map_err(|e| InfraError::io(format!("create parent of {dst_str}"), e))?;
            self.hg(&["clone", "-U", url.as_str(), dst_str])?;
        }

        let mut args = vec!["update", "-R", dst_str];
        if let Some(r) = &rev {
            args.extend(["-r", r.as_str()]);
        }
        self.hg(&args)?;
        Ok(())
    }
}
