//! Folder watching for automatic content checks
//!
//! Watches the configured content directory and submits a check for every
//! file that is created or modified, provided its extension is on the
//! allow-list. Each detected file goes through the batch dispatcher as a
//! single-file batch in automated mode, so it inherits the same
//! concurrency cap, pacing, and retry behavior as explicit batch runs.
//!
//! A short settle delay is applied before reading each file, since some
//! editors write in chunks or write-then-rename.

use crate::config::Config;
use crate::discovery::has_allowed_extension;
use crate::dispatcher::BatchDispatcher;
use crate::error::{Error, Result};
use crate::types::CheckMode;
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Watches the content directory and checks changed files automatically
pub struct FolderWatcher {
    /// Filesystem watcher instance
    watcher: RecommendedWatcher,

    /// Channel for receiving filesystem events
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,

    /// Dispatcher used to run single-file automated checks
    dispatcher: Arc<BatchDispatcher>,

    /// Shared configuration (content dir, allow-list, settle delay)
    config: Arc<Config>,

    /// Stops the event loop when triggered
    cancel: CancellationToken,
}

impl FolderWatcher {
    /// Create a new folder watcher
    ///
    /// # Errors
    /// Returns error if the filesystem watcher cannot be initialized
    pub fn new(
        dispatcher: Arc<BatchDispatcher>,
        config: Arc<Config>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.send(res) {
                    error!("Failed to send filesystem event: {}", e);
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::Watch(e.to_string()))?;

        Ok(Self {
            watcher,
            rx,
            dispatcher,
            config,
            cancel,
        })
    }

    /// Start watching the configured content directory
    ///
    /// The directory is created if it does not exist. Watching is
    /// recursive to match discovery's view of the content tree.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or watched
    pub fn start(&mut self) -> Result<()> {
        let root = &self.config.batch.content_dir;
        if !root.exists() {
            std::fs::create_dir_all(root)
                .map_err(|e| Error::Watch(format!("Failed to create content directory: {e}")))?;
            info!("Created content directory: {}", root.display());
        }

        self.watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| Error::Watch(format!("Failed to watch content directory: {e}")))?;

        info!("Watching content directory: {}", root.display());
        Ok(())
    }

    /// Run the watcher event loop until cancelled or the channel closes
    pub async fn run(mut self) {
        info!("Folder watcher started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Folder watcher cancelled");
                    break;
                }
                result = self.rx.recv() => {
                    match result {
                        Some(Ok(event)) => self.handle_event(event).await,
                        Some(Err(e)) => error!("Filesystem watcher error: {}", e),
                        None => break,
                    }
                }
            }
        }

        info!("Folder watcher stopped");
    }

    /// Process a filesystem event, checking any eligible files it names
    async fn handle_event(&self, event: Event) {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => {
                for path in event.paths {
                    if self.is_checkable_file(&path) {
                        self.process_file(&path).await;
                    }
                }
            }
            _ => {
                // Ignore other event types (delete, access, etc.)
            }
        }
    }

    /// Whether this path should trigger an automated check
    ///
    /// Requires an allow-listed extension and a visible (non-dotted)
    /// file name.
    fn is_checkable_file(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(true);

        !hidden && has_allowed_extension(path, &self.config.batch.allowed_extensions)
    }

    /// Run one automated check for a newly written file
    async fn process_file(&self, path: &Path) {
        debug!("Detected content change: {}", path.display());

        // Let the writer finish before reading the file
        tokio::time::sleep(self.config.watch.settle_delay).await;
        if self.cancel.is_cancelled() {
            return;
        }

        let (_, outcomes) = self
            .dispatcher
            .dispatch_batch(
                vec![path.to_path_buf()],
                None,
                CheckMode::Automated,
                self.cancel.clone(),
            )
            .await;

        match outcomes.first() {
            Some(outcome) if outcome.succeeded => {
                info!(
                    file = %path.display(),
                    link = outcome.result_link.as_deref().unwrap_or(""),
                    "Automated check passed"
                );
            }
            Some(_) => {
                warn!(file = %path.display(), "Automated check failed");
            }
            None => {
                debug!(file = %path.display(), "Automated check skipped");
            }
        }
    }
}
