//! Source getter dispatch: pick a protocol handler for a source string and
//! let it populate a destination directory.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};
use url::Url;

use crate::application::error::{BoxError, FetchError};
use crate::domain::split_forced_getter;

/// A protocol handler that downloads or updates a module.
///
/// `dst` may already exist, in which case the getter updates it in place.
/// If the existing contents are not something the getter recognizes it
/// must fail instead of wiping the directory. On success `dst` holds a
/// complete copy of the source.
pub trait Getter: Send + Sync {
    fn get(&self, dst: &Path, url: &Url) -> Result<(), BoxError>;
}

/// Scheme → getter mapping used by [`fetch`].
///
/// Built once (usually via `infrastructure::getters::default_registry`),
/// adjusted through `&mut self`, then shared read-only behind an `Arc`.
#[derive(Clone, Default)]
pub struct GetterRegistry {
    getters: HashMap<String, Arc<dyn Getter>>,
}

impl fmt::Debug for GetterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<_> = self.schemes().collect();
        schemes.sort_unstable();
        f.debug_struct("GetterRegistry")
            .field("schemes", &schemes)
            .finish()
    }
}

impl GetterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `getter` for `scheme`, returning the handler it replaces.
    pub fn insert(
        &mut self,
        scheme: impl Into<String>,
        getter: Arc<dyn Getter>,
    ) -> Option<Arc<dyn Getter>> {
        self.getters.insert(scheme.into().to_ascii_lowercase(), getter)
    }

    pub fn with(mut self, scheme: impl Into<String>, getter: Arc<dyn Getter>) -> Self {
        self.insert(scheme, getter);
        self
    }

    pub fn get(&self, scheme: &str) -> Option<&Arc<dyn Getter>> {
        self.getters.get(scheme)
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.getters.keys().map(String::as_str)
    }

    /// Download `src` into `dst`. See [`fetch`].
    pub fn fetch(&self, dst: &Path, src: &str) -> Result<(), FetchError> {
        fetch(self, dst, src)
    }
}

/// Download the module at `src` into the directory `dst`, updating it if
/// it already exists.
///
/// `src` is a URL, optionally prefixed with a forced getter
/// (`git::https://host/repo.git`). The forced getter wins over the URL's
/// own scheme.
#[instrument(level = "debug", skip(registry))]
pub fn fetch(registry: &GetterRegistry, dst: &Path, src: &str) -> Result<(), FetchError> {
    let (force, rest) = split_forced_getter(src);

    let url = Url::parse(rest).map_err(|e| FetchError::InvalidLocator {
        src: src.to_string(),
        source: e,
    })?;

    let scheme = force.unwrap_or_else(|| url.scheme()).to_ascii_lowercase();
    let getter = registry
        .get(&scheme)
        .ok_or_else(|| FetchError::UnsupportedScheme(scheme.clone()))?;

    debug!("fetch: scheme={} dst={}", scheme, dst.display());
    getter.get(dst, &url).map_err(|e| FetchError::Download {
        src: src.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    impl Getter for Recording {
        fn get(&self, _dst: &Path, url: &Url) -> Result<(), BoxError> {
            self.0.lock().push(url.to_string());
            Ok(())
        }
    }

    struct Failing;

    impl Getter for Failing {
        fn get(&self, _dst: &Path, _url: &Url) -> Result<(), BoxError> {
            Err("connection refused".into())
        }
    }

    #[test]
    fn test_forced_getter_wins_over_url_scheme() {
        let git = Arc::new(Recording::default());
        let https = Arc::new(Recording::default());
        let registry = GetterRegistry::new()
            .with("git", git.clone())
            .with("https", https.clone());

        registry
            .fetch(Path::new("/tmp/x"), "git::https://example.com/repo.git")
            .unwrap();

        assert_eq!(*git.0.lock(), vec!["https://example.com/repo.git"]);
        assert!(https.0.lock().is_empty());
    }

    #[test]
    fn test_unknown_scheme_is_named() {
        let err = GetterRegistry::new()
            .fetch(Path::new("/tmp/x"), "ftp://example.com/x")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "module download not supported for scheme 'ftp'"
        );
    }

    #[test]
    fn test_getter_failure_keeps_original_source() {
        let registry = GetterRegistry::new().with("git", Arc::new(Failing));
        let err = registry
            .fetch(Path::new("/tmp/x"), "git::https://example.com/r.git")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "error downloading module 'git::https://example.com/r.git': connection refused"
        );
    }

    #[test]
    fn test_unparsable_source_is_locator_error() {
        let err = GetterRegistry::new()
            .fetch(Path::new("/tmp/x"), "not a url")
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidLocator { .. }));
    }
}
