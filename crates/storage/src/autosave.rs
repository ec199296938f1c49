use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use prep_core::model::UserId;

use crate::document::ProgressDocument;
use crate::repository::ProgressRepository;

/// How long mutations must stay quiet before the pending document is written.
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_secs(2);

//
// ─── DEBOUNCED SAVER ───────────────────────────────────────────────────────────
//

/// Fire-and-forget persistence of the progress document.
///
/// Every mutation queues the full document; rapid mutations coalesce and the
/// newest snapshot is written once per quiescent window. A failed write is
/// logged and dropped, never retried, and never blocks the session. The
/// in-memory state stays authoritative either way.
pub struct DebouncedSaver {
    tx: mpsc::UnboundedSender<ProgressDocument>,
    worker: JoinHandle<()>,
}

impl DebouncedSaver {
    /// Spawn the saver with the default 2 second quiet window.
    #[must_use]
    pub fn new(repository: Arc<dyn ProgressRepository>, user: UserId) -> Self {
        Self::with_window(repository, user, DEFAULT_QUIET_WINDOW)
    }

    /// Spawn the saver with a custom quiet window.
    #[must_use]
    pub fn with_window(
        repository: Arc<dyn ProgressRepository>,
        user: UserId,
        window: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(repository, user, window, rx));
        Self { tx, worker }
    }

    /// Queue the latest document snapshot; replaces any not-yet-written one.
    pub fn queue(&self, document: ProgressDocument) {
        if self.tx.send(document).is_err() {
            warn!("progress autosave worker is gone; dropping snapshot");
        }
    }

    /// Stop accepting snapshots and wait for the final pending write.
    pub async fn flush(self) {
        drop(self.tx);
        if self.worker.await.is_err() {
            warn!("progress autosave worker ended abnormally");
        }
    }
}

async fn run(
    repository: Arc<dyn ProgressRepository>,
    user: UserId,
    window: Duration,
    mut rx: mpsc::UnboundedReceiver<ProgressDocument>,
) {
    while let Some(mut pending) = rx.recv().await {
        // Coalesce until the channel stays quiet for a full window.
        let closed = loop {
            match tokio::time::timeout(window, rx.recv()).await {
                Ok(Some(newer)) => pending = newer,
                Ok(None) => break true,
                Err(_) => break false,
            }
        };

        if let Err(error) = repository.save(&user, &pending, true).await {
            warn!(user = %user, %error, "failed to persist progress; keeping in-memory state");
        }

        if closed {
            return;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
