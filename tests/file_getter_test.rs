//! Tests for the file getter and FolderStorage on the real filesystem

use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;
use url::Url;

use modtree::application::{BoxError, FetchError, FolderStorage, Getter, GetterRegistry, Storage};
use modtree::infrastructure::getters::{default_registry, FileGetter};
use modtree::infrastructure::traits::{RealCommandRunner, RealFileSystem};

fn file_url(path: &Path) -> Url {
    Url::from_file_path(path).unwrap()
}

// ============================================================
// FileGetter
// ============================================================

#[cfg(unix)]
#[test]
fn given_directory_when_get_then_destination_links_to_it() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("module");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("main.toml"), "").unwrap();
    let dst = temp.path().join("store/abc");

    FileGetter::new(Arc::new(RealFileSystem))
        .get(&dst, &file_url(&src))
        .unwrap();

    assert!(fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());
    assert_eq!(fs::read_link(&dst).unwrap(), src);
    assert!(dst.join("main.toml").is_file());
}

#[cfg(unix)]
#[test]
fn given_existing_link_when_get_then_link_is_replaced() {
    let temp = TempDir::new().unwrap();
    let old = temp.path().join("old");
    let new = temp.path().join("new");
    fs::create_dir_all(&old).unwrap();
    fs::create_dir_all(&new).unwrap();
    let dst = temp.path().join("dst");
    std::os::unix::fs::symlink(&old, &dst).unwrap();

    FileGetter::new(Arc::new(RealFileSystem))
        .get(&dst, &file_url(&new))
        .unwrap();

    assert_eq!(fs::read_link(&dst).unwrap(), new);
}

#[test]
fn given_real_directory_at_destination_when_get_then_fails_without_touching_it() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("module");
    fs::create_dir_all(&src).unwrap();
    let dst = temp.path().join("dst");
    fs::create_dir_all(&dst).unwrap();
    fs::write(dst.join("keep.txt"), "data").unwrap();

    let err = FileGetter::new(Arc::new(RealFileSystem))
        .get(&dst, &file_url(&src))
        .unwrap_err();

    assert!(err.to_string().contains("not a symlink"), "{err}");
    assert!(dst.join("keep.txt").is_file());
}

#[test]
fn given_missing_source_when_get_then_fails() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("absent");

    let err = FileGetter::new(Arc::new(RealFileSystem))
        .get(&temp.path().join("dst"), &file_url(&src))
        .unwrap_err();

    assert!(err.to_string().contains("source path error"), "{err}");
}

#[test]
fn given_file_source_when_get_then_fails() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("main.toml");
    fs::write(&src, "").unwrap();

    let err = FileGetter::new(Arc::new(RealFileSystem))
        .get(&temp.path().join("dst"), &file_url(&src))
        .unwrap_err();

    assert!(err.to_string().contains("must be a directory"), "{err}");
}

// ============================================================
// FolderStorage
// ============================================================

/// Getter that creates the destination and counts calls.
#[derive(Default)]
struct CountingGetter(Mutex<usize>);

impl Getter for CountingGetter {
    fn get(&self, dst: &Path, _url: &Url) -> Result<(), BoxError> {
        fs::create_dir_all(dst)?;
        *self.0.lock() += 1;
        Ok(())
    }
}

fn counting_storage(root: &Path) -> (FolderStorage, Arc<CountingGetter>) {
    let getter = Arc::new(CountingGetter::default());
    let registry = GetterRegistry::new().with("https", getter.clone());
    let storage = FolderStorage::new(root, Arc::new(RealFileSystem), Arc::new(registry));
    (storage, getter)
}

#[test]
fn given_new_source_when_resolve_or_fetch_then_downloads_into_hashed_dir() {
    let temp = TempDir::new().unwrap();
    let (storage, getter) = counting_storage(&temp.path().join("store"));
    let source = "https://example.com/net.tgz";

    assert!(storage.locate_local(source).unwrap().is_none());
    storage.resolve_or_fetch(source, false).unwrap();

    let dir = storage.locate_local(source).unwrap().unwrap();
    assert_eq!(dir, storage.dir_for(source));
    let key = dir.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(*getter.0.lock(), 1);
}

#[test]
fn given_present_source_when_resolve_without_update_then_skips_download() {
    let temp = TempDir::new().unwrap();
    let (storage, getter) = counting_storage(temp.path());
    let source = "https://example.com/net.tgz";

    storage.resolve_or_fetch(source, false).unwrap();
    storage.resolve_or_fetch(source, false).unwrap();
    storage.resolve_or_fetch(source, true).unwrap();

    assert_eq!(*getter.0.lock(), 2);
}

#[test]
fn given_different_sources_when_resolved_then_stored_apart() {
    let temp = TempDir::new().unwrap();
    let (storage, _) = counting_storage(temp.path());

    assert_ne!(
        storage.dir_for("https://example.com/a.tgz"),
        storage.dir_for("https://example.com/a.tgz?v=2")
    );
}

#[test]
fn given_unsupported_scheme_when_resolve_then_fetch_error_surfaces() {
    let temp = TempDir::new().unwrap();
    let (storage, _) = counting_storage(temp.path());

    let err = storage.resolve_or_fetch("s3://bucket/mod", false).unwrap_err();

    assert_eq!(
        err.to_string(),
        "module download not supported for scheme 's3'"
    );
    assert!(storage.locate_local("s3://bucket/mod").unwrap().is_none());
}

#[cfg(unix)]
#[test]
fn given_default_registry_when_resolving_local_module_then_storage_holds_link() {
    let temp = TempDir::new().unwrap();
    let module = temp.path().join("module");
    fs::create_dir_all(&module).unwrap();
    let real_fs = Arc::new(RealFileSystem);
    let registry = default_registry(real_fs.clone(), Arc::new(RealCommandRunner));
    let storage = FolderStorage::new(temp.path().join("store"), real_fs, Arc::new(registry));
    let source = file_url(&module).to_string();

    storage.resolve_or_fetch(&source, false).unwrap();
    // a second update replaces the link in place
    storage.resolve_or_fetch(&source, true).unwrap();

    let dir = storage.locate_local(&source).unwrap().unwrap();
    assert_eq!(fs::read_link(dir).unwrap(), module);
}

#[test]
fn given_unknown_getter_when_fetch_then_error_matches_fetch_error() {
    let registry = GetterRegistry::new();

    let err = registry
        .fetch(Path::new("/tmp/none"), "hg::https://example.com/repo")
        .unwrap_err();

    assert!(matches!(err, FetchError::UnsupportedScheme(ref s) if s == "hg"));
}
