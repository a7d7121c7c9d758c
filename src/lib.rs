//! # content-check
//!
//! Throttled batch client library for remote content-quality checking
//! services.
//!
//! ## Design Philosophy
//!
//! content-check is designed to be:
//! - **Gentle on the remote** - Bounded concurrency and request pacing keep
//!   batch runs under the service's rate limits
//! - **Resilient** - Transient failures are retried with exponential
//!   backoff and jitter; one bad file never sinks a batch
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Order-preserving** - Batch outcomes come back in input order no
//!   matter how the checks interleave
//!
//! ## Quick Start
//!
//! ```no_run
//! use content_check::{
//!     BatchDispatcher, CheckClient, CheckInvoker, CheckMode, Config,
//!     discover_files, summarize,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::from_env()?);
//!
//!     let client = Arc::new(CheckClient::new(config.remote.clone())?);
//!     let invoker = Arc::new(CheckInvoker::new(client, Arc::clone(&config)));
//!     let dispatcher = BatchDispatcher::new(invoker, Arc::clone(&config));
//!
//!     let files = discover_files(&config.batch)?;
//!     let (batch_id, outcomes) = dispatcher
//!         .dispatch_batch(files, None, CheckMode::Batch, CancellationToken::new())
//!         .await;
//!
//!     let summary = summarize(&batch_id, &outcomes);
//!     println!("{} ok, {} failed", summary.success_count, summary.failure_count);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Summary reporting and browser opening
pub mod browser;
/// Single-file check invocation
pub mod checker;
/// HTTP client for the remote check service
pub mod client;
/// Configuration types
pub mod config;
/// Content file discovery
pub mod discovery;
/// Throttled batch dispatch
pub mod dispatcher;
/// Error types
pub mod error;
/// Folder watching for automatic checks
pub mod folder_watcher;
/// Retry logic with exponential backoff
pub mod retry;
/// Batch result aggregation
pub mod summary;
/// Core types
pub mod types;

// Re-export commonly used types
pub use browser::{announce_summary, open_result_link};
pub use checker::CheckInvoker;
pub use client::{AccessToken, CheckClient, CheckResponse, CheckService};
pub use config::{BatchConfig, Config, RemoteConfig, RetryConfig, WatchConfig};
pub use discovery::discover_files;
pub use dispatcher::BatchDispatcher;
pub use error::{Error, Result};
pub use folder_watcher::FolderWatcher;
pub use retry::{IsTransient, run_with_retry};
pub use summary::summarize;
pub use types::{
    BatchSummary, CheckMode, CheckOutcome, CheckRequest, default_batch_id,
};

use tokio_util::sync::CancellationToken;

/// Run until a termination signal arrives, then trigger the given token.
///
/// Long-running consumers (folder watching, large batches) pass the same
/// token they hand to the dispatcher; cancellation then propagates through
/// every in-flight check.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use content_check::run_with_shutdown;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let cancel = CancellationToken::new();
///     tokio::spawn(run_with_shutdown(cancel.clone()));
///     // ... dispatch batches with `cancel` ...
/// }
/// ```
pub async fn run_with_shutdown(cancel: CancellationToken) {
    wait_for_signal().await;
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        _ => {
            tracing::warn!("Could not register unix signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
