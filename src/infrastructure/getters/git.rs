//! Git sources, driven through the `git` command line.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::application::{BoxError, Getter};
use crate::infrastructure::getters::take_query_param;
use crate::infrastructure::process::run_command;
use crate::infrastructure::traits::{CommandRunner, FileSystem};
use crate::infrastructure::InfraError;

/// Clones or updates a git repository. A `ref` query parameter selects
/// the branch, tag or commit to check out.
pub struct GitGetter {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
}

impl GitGetter {
    pub fn new(fs: Arc<dyn FileSystem>, cmd: Arc<dyn CommandRunner>) -> Self {
        Self { fs, cmd }
    }

    fn git(&self, args: &[&str]) -> Result<(), InfraError> {
        run_command(self.cmd.as_ref(), "git", args)
    }

    /// Whether `origin/<reference>` is a remote-tracking branch in `dst`.
    fn is_remote_branch(&self, dst: &str, reference: &str) -> bool {
        let full = format!("refs/remotes/origin/{reference}");
        self.cmd
            .run("git", &["-C", dst, "rev-parse", "--verify", "--quiet", &full])
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

impl Getter for GitGetter {
    fn get(&self, dst: &Path, url: &Url) -> Result<(), BoxError> {
        let (url, reference) = take_query_param(url, "ref");
        let dst_owned = dst.to_string_lossy().into_owned();
        let dst_str = dst_owned.as_str();

        if !self.fs.exists(dst) {
            debug!("git: cloning {} into {}", url, dst_str);
            self.fs
                .ensure_parent(dst)
                .map_err(|e| InfraError::io(format!("create parent of {dst_str}"), e))?;
            self.git(&["clone", "--", url.as_str(), dst_str])?;
            if let Some(r) = &reference {
                self.git(&["-C", dst_str, "checkout", r.as_str()])?;
            }
            return Ok(());
        }

        if !self.fs.exists(&dst.join(".git")) {
            return Err(InfraError::UnrecognizedDestination {
                path: dst_owned.clone(),
                message: "destination exists and is not a git repository".into(),
            }
            .into());
        }
        debug!("git: updating {}", dst_str);
        match &reference {
            None => self.git(&["-C", dst_str, "pull", "--ff-only"])?,
            // a tag or commit leaves HEAD detached, where pull fails
            Some(r) => {
                self.git(&["-C", dst_str, "fetch", "--tags", "origin"])?;
                self.git(&["-C", dst_str, "checkout", r.as_str()])?;
                if self.is_remote_branch(dst_str, r) {
                    let upstream = format!("origin/{r}");
                    self.git(&["-C", dst_str, "merge", "--ff-only", &upstream])?;
                }
            }
        }
        Ok(())
    }
}
