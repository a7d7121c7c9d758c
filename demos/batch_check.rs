//! Batch check demo
//!
//! Discovers content files under the configured directory, submits them to
//! the remote check service as one batch, prints the summary, and opens
//! the representative result link in the default browser.
//!
//! Configuration comes from the environment (or a `.env` file):
//!
//! ```text
//! CONTENT_CHECK_API_URL=https://check.example.org/api
//! CONTENT_CHECK_API_TOKEN=...
//! CONTENT_CHECK_USERNAME=writer@example.org
//! CONTENT_CHECK_CLIENT_SIGNATURE=...
//! CONTENT_CHECK_CONTENT_DIR=./content
//! ```
//!
//! Run with: `cargo run --example batch_check`

use content_check::{
    BatchDispatcher, CheckClient, CheckInvoker, CheckMode, Config, announce_summary,
    discover_files, open_result_link, run_with_shutdown, summarize,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,content_check=debug".into()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let cancel = CancellationToken::new();
    tokio::spawn(run_with_shutdown(cancel.clone()));

    let files = discover_files(&config.batch)?;
    if files.is_empty() {
        println!(
            "No checkable files under {}",
            config.batch.content_dir.display()
        );
        return Ok(());
    }
    println!("Checking {} files...", files.len());

    let client = Arc::new(CheckClient::new(config.remote.clone())?);
    let invoker = Arc::new(CheckInvoker::new(client, Arc::clone(&config)));
    let dispatcher = BatchDispatcher::new(invoker, Arc::clone(&config));

    let (batch_id, outcomes) = dispatcher
        .dispatch_batch(files, None, CheckMode::Batch, cancel.clone())
        .await;

    let summary = summarize(&batch_id, &outcomes);
    announce_summary(&summary);

    println!(
        "Batch {}: {} succeeded, {} failed",
        summary.batch_id, summary.success_count, summary.failure_count
    );
    for outcome in &outcomes {
        match &outcome.result_link {
            Some(link) => println!("  ok   {}  {}", outcome.file_path.display(), link),
            None => println!("  FAIL {}", outcome.file_path.display()),
        }
    }

    if !cancel.is_cancelled() {
        open_result_link(&summary)?;
    }

    Ok(())
}
