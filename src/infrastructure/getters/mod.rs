//! Protocol getters bound into the default [`GetterRegistry`].

mod file;
mod git;
mod hg;
mod http;

use std::sync::Arc;

use url::Url;

use crate::application::GetterRegistry;
use crate::infrastructure::traits::{CommandRunner, FileSystem};

pub use file::FileGetter;
pub use git::GitGetter;
pub use hg::HgGetter;
pub use http::{unpack_tarball, HttpGetter, MODULE_GET_HEADER};

/// Registry with the built-in getters: `file`, `git`, `hg`, `http`, `https`.
pub fn default_registry(fs: Arc<dyn FileSystem>, cmd: Arc<dyn CommandRunner>) -> GetterRegistry {
    let http = Arc::new(HttpGetter::new(fs.clone()));
    GetterRegistry::new()
        .with("file", Arc::new(FileGetter::new(fs.clone())))
        .with("git", Arc::new(GitGetter::new(fs.clone(), cmd.clone())))
        .with("hg", Arc::new(HgGetter::new(fs, cmd)))
        .with("http", http.clone())
        .with("https", http)
}

/// Remove `key` from the query string, returning the cleaned URL and the
/// value of the first occurrence.
pub(crate) fn take_query_param(url: &Url, key: &str) -> (Url, Option<String>) {
    let mut value = None;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter_map(|(k, v)| {
            if k == key {
                value.get_or_insert_with(|| v.into_owned());
                None
            } else {
                Some((k.into_owned(), v.into_owned()))
            }
        })
        .collect();

    let mut cleaned = url.clone();
    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }
    (cleaned, value)
}
