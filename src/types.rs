//! Core types for content-check

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Report name for the per-file quality scorecard link
pub const REPORT_SCORECARD: &str = "scorecard";

/// Report name for the batch-level content analysis dashboard link
pub const REPORT_CONTENT_ANALYSIS: &str = "contentAnalysisDashboard";

/// How a check was initiated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMode {
    /// Triggered automatically (folder watching)
    Automated,
    /// Part of an explicit batch run
    Batch,
}

/// One content-check request, constructed per file at invocation time
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckRequest {
    /// Path of the file being checked
    pub file_path: PathBuf,

    /// Batch this request belongs to, if any
    pub batch_id: Option<String>,

    /// How the check was initiated
    pub check_mode: CheckMode,

    /// Full file content submitted for checking
    pub content: String,
}

/// Outcome of checking one file
///
/// Exactly one outcome exists per dispatched file. An absent `result_link`
/// means the check failed (locally or remotely).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Path of the checked file
    pub file_path: PathBuf,

    /// Link to the check result, when the check succeeded
    pub result_link: Option<String>,

    /// Whether the check succeeded
    pub succeeded: bool,
}

impl CheckOutcome {
    /// Build a successful outcome carrying its result link
    ///
    /// A success always has a link; an absent link means failure.
    pub fn success(file_path: PathBuf, result_link: String) -> Self {
        Self {
            file_path,
            result_link: Some(result_link),
            succeeded: true,
        }
    }

    /// Build a failed outcome (no result link by definition)
    pub fn failure(file_path: PathBuf) -> Self {
        Self {
            file_path,
            result_link: None,
            succeeded: false,
        }
    }
}

/// Summary of a whole batch run, derived once from its outcomes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// The batch identifier
    pub batch_id: String,

    /// Number of files that checked successfully
    pub success_count: usize,

    /// Number of files that failed (locally or remotely)
    pub failure_count: usize,

    /// A representative link to surface for the whole batch, if any
    /// succeeded with a non-blank link
    pub representative_link: Option<String>,
}

/// Generate a timestamp-derived batch id of the form `batch-YYYYMMDD-HHMMSS`
///
/// Used when the caller does not supply one. The token is opaque to the
/// remote service.
pub fn default_batch_id() -> String {
    Local::now().format("batch-%Y%m%d-%H%M%S").to_string()
}
