//! HTTP(S) sources: gzipped tarballs, directly or via a redirect header.

use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};
use tracing::debug;
use url::Url;

use crate::application::{BoxError, Getter};
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::{InfraError, InfraResult};

/// Response header naming the archive to download when the URL itself
/// is not one.
pub const MODULE_GET_HEADER: &str = "X-Module-Get";

/// Downloads `.tar.gz` / `.tgz` archives and unpacks them into the
/// destination. Other URLs must answer with an [`MODULE_GET_HEADER`]
/// header pointing at an archive.
pub struct HttpGetter {
    fs: Arc<dyn FileSystem>,
}

impl HttpGetter {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Unpack into a staging directory next to `dst`, then swap it in.
    /// Files removed upstream do not survive an update.
    fn get_archive(&self, dst: &Path, url: &Url) -> InfraResult<()> {
        let bytes = fetch_bytes(url.as_str())?;
        debug!("http: downloaded {} bytes from {}", bytes.len(), url);

        if self.fs.exists(dst) && !self.fs.is_dir(dst) {
            return Err(InfraError::UnrecognizedDestination {
                path: dst.display().to_string(),
                message: "destination exists and is not a directory".into(),
            });
        }
        let parent = match dst.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        self.fs
            .create_dir_all(parent)
            .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;

        let staging = tempfile::Builder::new()
            .prefix(".modtree-")
            .tempdir_in(parent)
            .map_err(|e| InfraError::io(format!("create staging dir in {}", parent.display()), e))?;
        let unpacked = staging.path().join("new");
        self.fs
            .create_dir_all(&unpacked)
            .map_err(|e| InfraError::io(format!("create {}", unpacked.display()), e))?;
        let root = unpack_tarball(&bytes, &unpacked)?;

        let old = staging.path().join("old");
        let replaced = self.fs.exists(dst) || self.fs.is_symlink(dst);
        if replaced {
            self.fs
                .rename(dst, &old)
                .map_err(|e| InfraError::io(format!("move aside {}", dst.display()), e))?;
        }
        if let Err(e) = self.fs.rename(&root, dst) {
            if replaced {
                // best effort: put the previous copy back
                let _ = self.fs.rename(&old, dst);
            }
            return Err(InfraError::io(format!("move into place {}", dst.display()), e));
        }
        debug!("http: unpacked into {}", dst.display());
        Ok(())
    }
}

impl Getter for HttpGetter {
    fn get(&self, dst: &Path, url: &Url) -> Result<(), BoxError> {
        if is_archive(url) {
            return Ok(self.get_archive(dst, url)?);
        }

        let response = ureq::get(url.as_str())
            .call()
            .map_err(|e| http_error(url.as_str(), e))?;
        let Some(location) = response.header(MODULE_GET_HEADER) else {
            return Err(InfraError::Http {
                url: url.to_string(),
                message: format!("no archive and no {MODULE_GET_HEADER} header in response"),
            }
            .into());
        };

        let target = url
            .join(location)
            .map_err(|e| InfraError::InvalidUrl(format!("{MODULE_GET_HEADER} {location}: {e}")))?;
        if !matches!(target.scheme(), "http" | "https") || !is_archive(&target) {
            return Err(InfraError::Http {
                url: url.to_string(),
                message: format!("{MODULE_GET_HEADER} must name an http(s) archive, got {target}"),
            }
            .into());
        }
        debug!("http: {} redirects to {}", url, target);
        Ok(self.get_archive(dst, &target)?)
    }
}

fn is_archive(url: &Url) -> bool {
    let path = url.path();
    path.ends_with(".tar.gz") || path.ends_with(".tgz")
}

fn http_error(url: &str, e: ureq::Error) -> InfraError {
    let message = match e {
        ureq::Error::Status(code, _) => format!("status {code}"),
        ureq::Error::Transport(t) => t.to_string(),
    };
    InfraError::Http {
        url: url.to_string(),
        message,
    }
}

/// Download raw bytes from a URL (blocking, follows redirects).
fn fetch_bytes(url: &str) -> InfraResult<Vec<u8>> {
    let response = ureq::get(url).call().map_err(|e| http_error(url, e))?;
    let mut buf = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut buf)
        .map_err(|e| InfraError::io(format!("read response of {url}"), e))?;
    Ok(buf)
}

/// Unpack a `.tar.gz` into the existing directory `dst`.
///
/// Returns the module root: the single top-level directory shared by all
/// entries (as in GitHub release archives), or `dst` itself. Entries and
/// links pointing outside `dst` fail the whole unpack.
pub fn unpack_tarball(tarball: &[u8], dst: &Path) -> InfraResult<PathBuf> {
    let prefix = common_prefix(tarball)?;

    let mut archive = Archive::new(GzDecoder::new(tarball));
    let entries = archive
        .entries()
        .map_err(|e| InfraError::io("read archive", e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| InfraError::io("read archive entry", e))?;
        let path = entry
            .path()
            .map_err(|e| InfraError::io("read archive entry path", e))?
            .into_owned();
        if !is_contained(&path) {
            return Err(escapes(&path, "archive entry escapes the destination"));
        }

        let kind = entry.header().entry_type();
        let link_escapes = match entry
            .link_name()
            .map_err(|e| InfraError::io("read archive link name", e))?
        {
            Some(target) => link_leaves_root(&path, &target, kind),
            None => false,
        };
        if link_escapes {
            return Err(escapes(&path, "archive link points outside the destination"));
        }

        // unpack_in refuses to write through links leading out of dst
        let unpacked = entry
            .unpack_in(dst)
            .map_err(|e| InfraError::io(format!("unpack {}", path.display()), e))?;
        if !unpacked {
            return Err(escapes(&path, "archive entry escapes the destination"));
        }
    }

    Ok(match prefix {
        Some(p) => dst.join(p),
        None => dst.to_path_buf(),
    })
}

/// The single top-level directory shared by all entries, if any.
fn common_prefix(tarball: &[u8]) -> InfraResult<Option<PathBuf>> {
    let mut archive = Archive::new(GzDecoder::new(tarball));
    let entries = archive
        .entries()
        .map_err(|e| InfraError::io("read archive", e))?;

    let mut prefix: Option<PathBuf> = None;
    for entry in entries {
        let entry = entry.map_err(|e| InfraError::io("read archive entry", e))?;
        let path = entry
            .path()
            .map_err(|e| InfraError::io("read archive entry path", e))?;
        let mut components = path.components();
        let first = match components.next() {
            Some(Component::Normal(first)) => PathBuf::from(first),
            _ => return Ok(None),
        };
        // a top-level file or link means there is nothing to strip
        if components.next().is_none() && !entry.header().entry_type().is_dir() {
            return Ok(None);
        }
        match &prefix {
            Some(p) if *p != first => return Ok(None),
            Some(_) => {}
            None => prefix = Some(first),
        }
    }
    Ok(prefix)
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Whether a link entry at `entry` pointing to `target` resolves outside
/// the archive root. Symlinks resolve from the entry's directory, hard
/// links from the root.
fn link_leaves_root(entry: &Path, target: &Path, kind: EntryType) -> bool {
    let base = if kind.is_symlink() { entry.parent() } else { None };
    let mut depth = 0usize;
    for c in base
        .into_iter()
        .flat_map(Path::components)
        .chain(target.components())
    {
        match c {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return true,
            },
            Component::RootDir | Component::Prefix(_) => return true,
        }
    }
    false
}

fn escapes(path: &Path, message: &str) -> InfraError {
    InfraError::UnrecognizedDestination {
        path: path.display().to_string(),
        message: message.into(),
    }
}
