//! Single-file check invocation
//!
//! [`CheckInvoker`] performs one content-check call against the remote
//! service for one file: it validates and reads the file locally, submits
//! the content through the retry policy, and selects which report link to
//! surface. It is the sole write boundary to the remote service and is safe
//! to invoke concurrently for different files; the only shared state is
//! read-only configuration, the service handle, and the once-initialized
//! access token.
//!
//! A file's failure here is always contained: `check` returns `None` and the
//! caller records a failed outcome, never aborting the rest of the batch.

use crate::client::{AccessToken, CheckService};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::retry::run_with_retry;
use crate::types::{CheckMode, CheckRequest, REPORT_CONTENT_ANALYSIS, REPORT_SCORECARD};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Performs one content-check call per file against the remote service
pub struct CheckInvoker {
    service: Arc<dyn CheckService>,
    config: Arc<Config>,

    /// Access token from the first successful sign-in; concurrent first
    /// callers coalesce on the same sign-in attempt
    access_token: OnceCell<AccessToken>,
}

impl CheckInvoker {
    /// Create an invoker over the given service and configuration
    pub fn new(service: Arc<dyn CheckService>, config: Arc<Config>) -> Self {
        Self {
            service,
            config,
            access_token: OnceCell::new(),
        }
    }

    /// Check one file, returning the selected result link on success
    ///
    /// Returns `None` for every failure class: file missing/unreadable/too
    /// large (local, never retried), remote failures after the retry policy
    /// is exhausted, and non-transient remote errors. All failures are
    /// reported via tracing with the file path for diagnosis.
    pub async fn check(
        &self,
        file_path: &Path,
        batch_id: Option<&str>,
        check_mode: CheckMode,
    ) -> Option<String> {
        let content = match self.read_content(file_path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    file = %file_path.display(),
                    error = %e,
                    "Skipping file that cannot be read"
                );
                return None;
            }
        };

        let token = match self.access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(
                    file = %file_path.display(),
                    error = %e,
                    "Sign-in failed, recording file as failed"
                );
                return None;
            }
        };

        let request = CheckRequest {
            file_path: file_path.to_path_buf(),
            batch_id: batch_id.map(str::to_string),
            check_mode,
            content,
        };

        let result = run_with_retry(&self.config.remote_retry, "submit_check", || {
            self.service.submit_check(token, &request)
        })
        .await;

        match result {
            Ok(response) => {
                let link = select_report_link(check_mode, &response.reports);
                if link.is_none() {
                    tracing::warn!(
                        file = %file_path.display(),
                        check_id = %response.id,
                        "Check completed but returned no usable report link"
                    );
                }
                link
            }
            Err(e) => {
                tracing::warn!(
                    file = %file_path.display(),
                    error = %e,
                    "Check failed for file, batch continues"
                );
                None
            }
        }
    }

    /// Validate and read the file content, enforcing the size cap
    ///
    /// The read itself goes through the local retry policy; a missing file
    /// is non-transient and fails on the first attempt.
    async fn read_content(&self, path: &Path) -> Result<String> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )));
        }
        if metadata.len() > self.config.batch.max_file_size {
            return Err(Error::FileTooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit: self.config.batch.max_file_size,
            });
        }

        let bytes = run_with_retry(&self.config.local_retry, "read_file", || async {
            tokio::fs::read(path).await.map_err(Error::from)
        })
        .await?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Sign in once and cache the access token for subsequent checks
    async fn access_token(&self) -> Result<&AccessToken> {
        self.access_token
            .get_or_try_init(|| {
                run_with_retry(&self.config.remote_retry, "sign_in", || {
                    self.service.sign_in()
                })
            })
            .await
    }
}

/// Select the report link to surface for a completed check
///
/// Batch runs prefer the batch-level content analysis dashboard; everything
/// falls back to the per-file scorecard. Blank links are treated as absent.
fn select_report_link(check_mode: CheckMode, reports: &HashMap<String, String>) -> Option<String> {
    let non_blank = |name: &str| {
        reports
            .get(name)
            .map(|link| link.trim())
            .filter(|link| !link.is_empty())
            .map(str::to_string)
    };

    if check_mode == CheckMode::Batch {
        if let Some(link) = non_blank(REPORT_CONTENT_ANALYSIS) {
            return Some(link);
        }
    }
    non_blank(REPORT_SCORECARD)
}
