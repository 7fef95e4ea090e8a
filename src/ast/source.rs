//! Source - provenance of a loaded document
//!
//! Every task/variable/prompt is stamped with the resolved location of the
//! document that declared it. The same value anchors relative references
//! (`extends`, `file`, `exec-file`) made by that document.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{KilnError, Result};

/// Resolved location of a configuration document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// Absolute local path
    Path(PathBuf),
    /// http(s) URL, used verbatim
    Url(Url),
}

impl Source {
    /// Resolve a reference against an optional base.
    ///
    /// - `http(s)://` refs are parsed verbatim.
    /// - Local refs resolve against the base document's directory, or `cwd`
    ///   when there is no base. Relative refs from a remote base are joined
    ///   onto the base URL.
    pub fn resolve(reference: &str, base: Option<&Source>, cwd: &Path) -> Result<Self> {
        if is_url(reference) {
            let url = Url::parse(reference).map_err(|e| KilnError::InvalidReference {
                reference: reference.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Source::Url(url));
        }

        match base {
            Some(Source::Url(base_url)) if !Path::new(reference).is_absolute() => {
                let url = base_url
                    .join(reference)
                    .map_err(|e| KilnError::InvalidReference {
                        reference: reference.to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(Source::Url(url))
            }
            _ => {
                let anchor = base
                    .and_then(Source::directory)
                    .unwrap_or_else(|| cwd.to_path_buf());
                Ok(Source::Path(normalize(&anchor.join(reference))))
            }
        }
    }

    /// Directory of a local source (None for URLs)
    pub fn directory(&self) -> Option<PathBuf> {
        match self {
            Source::Path(path) => path.parent().map(Path::to_path_buf),
            Source::Url(_) => None,
        }
    }

    /// Whether this source was fetched over the network
    pub fn is_remote(&self) -> bool {
        matches!(self, Source::Url(_))
    }

    /// Lowercased extension (`json`, `yaml`, ...) if any
    pub fn extension(&self) -> Option<String> {
        let last = match self {
            Source::Path(path) => path.file_name()?.to_string_lossy().into_owned(),
            Source::Url(url) => url.path_segments()?.last()?.to_string(),
        };
        last.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
    }

    /// Cache key: absolute path or full URL
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Url(url) => write!(f, "{}", url),
        }
    }
}

fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Lexically normalize `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_reference_is_verbatim() {
        let src = Source::resolve("https://example.com/base.json", None, Path::new("/work")).unwrap();
        assert_eq!(src.to_string(), "https://example.com/base.json");
        assert!(src.is_remote());
    }

    #[test]
    fn test_local_reference_resolves_against_cwd() {
        let src = Source::resolve("./configs/app.json", None, Path::new("/work")).unwrap();
        assert_eq!(src, Source::Path(PathBuf::from("/work/configs/app.json")));
    }

    #[test]
    fn test_local_reference_resolves_against_base_directory() {
        let base = Source::Path(PathBuf::from("/work/configs/app.json"));
        let src = Source::resolve("../shared/base.json", Some(&base), Path::new("/elsewhere")).unwrap();
        assert_eq!(src, Source::Path(PathBuf::from("/work/shared/base.json")));
    }

    #[test]
    fn test_relative_reference_from_remote_base_joins_url() {
        let base = Source::resolve("https://example.com/tpl/app.json", None, Path::new("/")).unwrap();
        let src = Source::resolve("base.json", Some(&base), Path::new("/work")).unwrap();
        assert_eq!(src.to_string(), "https://example.com/tpl/base.json");
    }

    #[test]
    fn test_extension_detection() {
        let yaml = Source::Path(PathBuf::from("/a/b/doc.YAML"));
        assert_eq!(yaml.extension().as_deref(), Some("yaml"));
        let url = Source::resolve("https://x.dev/a/doc.json", None, Path::new("/")).unwrap();
        assert_eq!(url.extension().as_deref(), Some("json"));
    }
}
