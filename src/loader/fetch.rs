//! Fetcher - reads a `Source` from disk or over HTTP
//!
//! Shared by the document store and by executors that load file templates
//! relative to their owning document.

use std::io::ErrorKind;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::ast::Source;
use crate::error::{KilnError, Result};
use crate::util::{CONNECT_TIMEOUT, FETCH_TIMEOUT, REDIRECT_LIMIT, USER_AGENT};

/// Reads local files and http(s) resources with a pooled client
#[derive(Clone)]
pub struct Fetcher {
    http_client: reqwest::Client,
}

impl Fetcher {
    /// Fetcher with the default timeouts
    pub fn new() -> Result<Self> {
        Self::with_timeouts(FETCH_TIMEOUT, CONNECT_TIMEOUT)
    }

    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(REDIRECT_LIMIT))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| KilnError::ConfigError {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { http_client })
    }

    /// Read the full text behind a source
    ///
    /// Missing files and non-2xx responses map to `DocumentNotFound`.
    #[instrument(skip(self), fields(source = %source))]
    pub async fn read(&self, source: &Source) -> Result<String> {
        match source {
            Source::Path(path) => {
                debug!("Reading local file");
                tokio::fs::read_to_string(path).await.map_err(|e| {
                    if e.kind() == ErrorKind::NotFound {
                        KilnError::DocumentNotFound {
                            reference: source.to_string(),
                        }
                    } else {
                        KilnError::Io(e)
                    }
                })
            }
            Source::Url(url) => {
                debug!("Fetching remote resource");
                let response = self
                    .http_client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| KilnError::FetchFailed {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })?;

                if !response.status().is_success() {
                    debug!(status = %response.status(), "Remote resource unavailable");
                    return Err(KilnError::DocumentNotFound {
                        reference: format!("{} (HTTP {})", url, response.status().as_u16()),
                    });
                }

                response.text().await.map_err(|e| KilnError::FetchFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let fetcher = Fetcher::new().unwrap();
        let text = fetcher.read(&Source::Path(path)).await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_missing_local_file_is_not_found() {
        let fetcher = Fetcher::new().unwrap();
        let err = fetcher
            .read(&Source::Path(PathBuf::from("/definitely/not/here.json")))
            .await
            .unwrap_err();
        assert!(matches!(err, KilnError::DocumentNotFound { .. }));
    }
}
