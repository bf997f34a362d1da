//! Live tree snapshots.
//!
//! Subscribes to the store once and republishes a freshly loaded tree after
//! every change notification. Receivers only ever see the latest snapshot.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{BookmarkStore, Group, Result};

use super::tree_loader::load_groups;

/// A published tree snapshot.
pub type Snapshot = Arc<Vec<Group>>;

/// Keeps a `watch` channel filled with the current tree.
pub struct TreeWatcher {
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl TreeWatcher {
    /// Load the tree once and start following store changes.
    ///
    /// # Errors
    /// Returns error if the initial load fails.
    pub async fn spawn(store: Arc<dyn BookmarkStore>) -> Result<Self> {
        // Subscribe first so a change during the initial load is not lost.
        let mut events = store.subscribe();
        let initial = load_groups(store.as_ref()).await?;
        let (tx, snapshots) = watch::channel(Arc::new(initial));

        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => tracing::trace!(id = event.id(), "Bookmark change"),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Change notifications lagged, reloading");
                    }
                    Err(RecvError::Closed) => break,
                }

                match load_groups(store.as_ref()).await {
                    Ok(groups) => {
                        if tx.send(Arc::new(groups)).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to reload bookmark tree"),
                }
            }
            tracing::debug!("Tree watcher stopped");
        });

        Ok(Self { snapshots, task })
    }

    /// A receiver that sees every later snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// The latest snapshot.
    #[must_use]
    pub fn current(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }
}

impl Drop for TreeWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
