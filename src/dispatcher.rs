//! Throttled batch dispatch with bounded concurrency
//!
//! [`BatchDispatcher`] fans the [`CheckInvoker`] out over a list of files
//! while keeping the remote service happy: at most `max_concurrent_checks`
//! calls are in flight at once (a counting semaphore is the only shared
//! gate), and every task holds its slot through a fixed pacing delay after
//! its call returns, throttling overall throughput to roughly
//! N requests per (call latency + pacing delay).
//!
//! Outcomes are collected into index-addressed slots, so the returned
//! sequence preserves input order regardless of completion order. The
//! shared [`CancellationToken`] is observed at every suspension point:
//! permit acquisition, the check call itself, and the pacing delay. Files
//! never admitted after cancellation produce no outcome; every admitted
//! file produces exactly one.

use crate::checker::CheckInvoker;
use crate::config::Config;
use crate::types::{CheckMode, CheckOutcome, default_batch_id};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Dispatches batches of files through the check pipeline
pub struct BatchDispatcher {
    invoker: Arc<CheckInvoker>,
    config: Arc<Config>,
}

impl BatchDispatcher {
    /// Create a dispatcher over the given invoker and configuration
    pub fn new(invoker: Arc<CheckInvoker>, config: Arc<Config>) -> Self {
        Self { invoker, config }
    }

    /// Check every file in `file_paths`, returning outcomes in input order
    ///
    /// When `batch_id` is `None`, a timestamp-derived id of the form
    /// `batch-YYYYMMDD-HHMMSS` is generated. Individual file failures are
    /// recorded as failed outcomes and never abort the batch. Returns the
    /// generated or supplied batch id alongside the outcomes.
    pub async fn dispatch_batch(
        &self,
        file_paths: Vec<PathBuf>,
        batch_id: Option<String>,
        check_mode: CheckMode,
        cancel_token: CancellationToken,
    ) -> (String, Vec<CheckOutcome>) {
        let batch_id = batch_id.unwrap_or_else(default_batch_id);
        let total = file_paths.len();

        tracing::info!(
            batch_id = %batch_id,
            files = total,
            concurrency = self.config.batch.max_concurrent_checks,
            pacing_ms = self.config.batch.pacing_delay.as_millis(),
            "Dispatching batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.batch.max_concurrent_checks));
        let batch_id_shared: Arc<str> = Arc::from(batch_id.as_str());

        let mut handles = Vec::with_capacity(total);
        for (index, path) in file_paths.into_iter().enumerate() {
            let invoker = Arc::clone(&self.invoker);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel_token.clone();
            let batch_id = Arc::clone(&batch_id_shared);
            let pacing = self.config.batch.pacing_delay;

            handles.push(tokio::spawn(async move {
                let permit = tokio::select! {
                    _ = cancel.cancelled() => return (index, None),
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(p) => p,
                        Err(_) => return (index, None),
                    },
                };

                let link = tokio::select! {
                    _ = cancel.cancelled() => {
                        // In-flight call unwinds; the file counts as not dispatched
                        drop(permit);
                        return (index, None);
                    }
                    link = invoker.check(&path, Some(&*batch_id), check_mode) => link,
                };

                let outcome = match link {
                    Some(link) => CheckOutcome::success(path, link),
                    None => CheckOutcome::failure(path),
                };

                // Pacing delay counts against this slot-holding time; a
                // cancellation only shortens the delay, the outcome stands
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(pacing) => {}
                }
                drop(permit);

                (index, Some(outcome))
            }));
        }

        let mut slots: Vec<Option<CheckOutcome>> = (0..total).map(|_| None).collect();
        for result in futures::future::join_all(handles).await {
            match result {
                Ok((index, outcome)) => slots[index] = outcome,
                Err(e) => {
                    tracing::error!(batch_id = %batch_id, error = %e, "Check task panicked");
                }
            }
        }

        let outcomes: Vec<CheckOutcome> = slots.into_iter().flatten().collect();

        tracing::info!(
            batch_id = %batch_id,
            dispatched = outcomes.len(),
            skipped = total - outcomes.len(),
            "Batch complete"
        );

        (batch_id, outcomes)
    }
}
