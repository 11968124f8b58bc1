//! Source locators: forced-getter syntax and detection of shorthand sources.
//!
//! A source is either a URL (`https://host/x.tar.gz`, `file:///abs/dir`),
//! optionally prefixed with a forced getter (`git::https://host/repo.git`),
//! or a shorthand that detection turns into one (`./child`,
//! `github.com/owner/repo`).

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::domain::error::DomainError;

static FORCED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)::(.+)$").expect("static regex"));

/// Split `<getter>::<rest>` into the forced getter and the remaining source.
///
/// Returns `(None, src)` if no getter is forced.
pub fn split_forced_getter(src: &str) -> (Option<&str>, &str) {
    match FORCED.captures(src) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(force), Some(rest)) => (Some(force.as_str()), rest.as_str()),
            _ => (None, src),
        },
        None => (None, src),
    }
}

/// Turns a shorthand source into a URL-style source, if it recognizes it.
pub trait Detector: Send + Sync {
    fn detect(&self, src: &str, pwd: &Path) -> Result<Option<String>, DomainError>;
}

/// `github.com/<owner>/<repo>[/...][?query]` → `git::https://github.com/<owner>/<repo>.git`.
#[derive(Debug, Default)]
pub struct GitHubDetector;

impl Detector for GitHubDetector {
    fn detect(&self, src: &str, _pwd: &Path) -> Result<Option<String>, DomainError> {
        let Some(rest) = src.strip_prefix("github.com/") else {
            return Ok(None);
        };
        let (path, query) = match rest.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (rest, None),
        };
        let mut parts = path.split('/');
        let (Some(owner), Some(repo)) = (parts.next(), parts.next()) else {
            return Err(DomainError::InvalidSource(src.to_string()));
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(DomainError::InvalidSource(src.to_string()));
        }
        let repo = repo.trim_end_matches(".git");

        let mut url = format!("git::https://github.com/{owner}/{repo}.git");
        if let Some(q) = query {
            url.push('?');
            url.push_str(q);
        }
        Ok(Some(url))
    }
}

/// Local paths, relative ones resolved against `pwd` → `file://<abs>`.
#[derive(Debug, Default)]
pub struct FileDetector;

impl Detector for FileDetector {
    fn detect(&self, src: &str, pwd: &Path) -> Result<Option<String>, DomainError> {
        if src.is_empty() {
            return Ok(None);
        }
        let path = Path::new(src);
        let abs = if path.is_absolute() {
            path.to_path_buf()
        } else {
            if !pwd.is_absolute() {
                return Err(DomainError::InvalidSource(format!(
                    "relative source {src} needs an absolute base directory, got {}",
                    pwd.display()
                )));
            }
            pwd.join(path)
        };
        let url = Url::from_file_path(&abs).map_err(|()| {
            DomainError::InvalidSource(format!("not a file path: {}", abs.display()))
        })?;
        Ok(Some(url.to_string()))
    }
}

/// Normalize `src` into a URL-style source, resolving local paths
/// against `pwd` (the directory of the configuration declaring it).
///
/// A forced getter prefix is preserved. Sources that already carry a
/// scheme are returned unchanged.
pub fn detect(src: &str, pwd: &Path) -> Result<String, DomainError> {
    let detectors: [&dyn Detector; 2] = [&GitHubDetector, &FileDetector];
    detect_with(src, pwd, &detectors)
}

/// Like [`detect`], with an explicit detector chain.
pub fn detect_with(
    src: &str,
    pwd: &Path,
    detectors: &[&dyn Detector],
) -> Result<String, DomainError> {
    let (force, rest) = split_forced_getter(src);

    if has_scheme(rest) {
        return Ok(src.to_string());
    }

    for d in detectors {
        if let Some(result) = d.detect(rest, pwd)? {
            return Ok(match force {
                Some(f) => format!("{f}::{result}"),
                None => result,
            });
        }
    }

    Err(DomainError::InvalidSource(src.to_string()))
}

fn has_scheme(src: &str) -> bool {
    match Url::parse(src) {
        // single-letter "schemes" are Windows drive letters, not URLs
        Ok(u) => u.scheme().len() > 1,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("git::https://example.com/repo.git", Some("git"), "https://example.com/repo.git")]
    #[case("hg::http://example.com/r", Some("hg"), "http://example.com/r")]
    #[case("https://example.com/x.tar.gz", None, "https://example.com/x.tar.gz")]
    #[case("git1::https://x", None, "git1::https://x")]
    #[case("::https://x", None, "::https://x")]
    fn test_split_forced_getter(
        #[case] src: &str,
        #[case] force: Option<&str>,
        #[case] rest: &str,
    ) {
        assert_eq!(split_forced_getter(src), (force, rest));
    }

    #[test]
    fn test_detect_keeps_urls_unchanged() {
        let pwd = Path::new("/work");
        assert_eq!(
            detect("git::https://example.com/r.git", pwd).unwrap(),
            "git::https://example.com/r.git"
        );
        assert_eq!(
            detect("https://example.com/a.tgz", pwd).unwrap(),
            "https://example.com/a.tgz"
        );
    }

    #[test]
    fn test_detect_relative_path_against_pwd() {
        assert_eq!(
            detect("./child", Path::new("/work/root")).unwrap(),
            "file:///work/root/child"
        );
        assert_eq!(detect("/abs/m", Path::new("/x")).unwrap(), "file:///abs/m");
    }

    #[test]
    fn test_detect_relative_path_needs_absolute_pwd() {
        assert!(detect("child", Path::new("rel")).is_err());
    }

    #[test]
    fn test_detect_github_shorthand() {
        assert_eq!(
            detect("github.com/acme/net?ref=v1", Path::new("/")).unwrap(),
            "git::https://github.com/acme/net.git?ref=v1"
        );
        assert!(detect("github.com/acme", Path::new("/")).is_err());
    }

    #[test]
    fn test_detect_preserves_forced_getter() {
        assert_eq!(
            detect("hg::./repo", Path::new("/w")).unwrap(),
            "hg::file:///w/repo"
        );
    }

    #[test]
    fn test_detect_escapes_url_delimiters_in_paths() {
        let source = detect("./a#b?c%d", Path::new("/w")).unwrap();

        assert_eq!(source, "file:///w/a%23b%3Fc%25d");
        let url = Url::parse(&source).unwrap();
        assert_eq!(url.to_file_path().unwrap(), Path::new("/w/a#b?c%d"));
    }

    #[test]
    fn test_detect_empty_source_fails() {
        let err = detect("", Path::new("/w")).unwrap_err();
        assert_eq!(err.to_string(), "invalid source string: ");
    }
}
