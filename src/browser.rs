//! Batch summary reporting and result link opening
//!
//! After a batch completes, the summary is logged and the representative
//! result link can be opened in the user's default browser. Opening shells
//! out to the platform opener (`xdg-open`, `open`, or `cmd /C start`) and
//! never blocks on the spawned process.

use crate::error::{Error, Result};
use crate::types::BatchSummary;
use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Log the outcome of a batch run
pub fn announce_summary(summary: &BatchSummary) {
    info!(
        batch_id = %summary.batch_id,
        succeeded = summary.success_count,
        failed = summary.failure_count,
        link = summary.representative_link.as_deref().unwrap_or(""),
        "Batch summary"
    );

    if summary.failure_count > 0 {
        warn!(
            batch_id = %summary.batch_id,
            failed = summary.failure_count,
            "Some files did not check cleanly"
        );
    }
}

/// Open the batch's representative result link in the default browser
///
/// Does nothing when the batch produced no link.
///
/// # Errors
/// Returns error if the platform opener cannot be spawned
pub fn open_result_link(summary: &BatchSummary) -> Result<()> {
    match summary.representative_link.as_deref() {
        Some(link) => open_link(link),
        None => {
            info!(batch_id = %summary.batch_id, "No result link to open");
            Ok(())
        }
    }
}

/// Open a URL in the default browser via the platform opener
///
/// # Errors
/// Returns error if the opener process cannot be spawned
pub fn open_link(url: &str) -> Result<()> {
    let (program, args) = opener_command(url);

    info!(url = %url, "Opening result link");
    Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| Error::Other(format!("failed to open {url}: {e}")))?;

    Ok(())
}

/// Platform opener invocation for a URL
fn opener_command(url: &str) -> (&'static str, Vec<String>) {
    #[cfg(target_os = "macos")]
    {
        ("open", vec![url.to_string()])
    }
    #[cfg(target_os = "windows")]
    {
        // `start` treats the first quoted argument as a window title
        ("cmd", vec!["/C".into(), "start".into(), String::new(), url.to_string()])
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        ("xdg-open", vec![url.to_string()])
    }
}
