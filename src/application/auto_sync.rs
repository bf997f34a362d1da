//! Auto-sync scheduler.
//!
//! One task decides when to mirror: a quiet period after the last tree
//! change, a periodic tick, or a manual trigger. Each decision spawns a
//! `FolderMirror::sync` of the latest published snapshot; overlapping writes
//! are coalesced by the mirror.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::SyncConfig;

use super::folder_mirror::{FolderMirror, SyncOutcome};
use super::tree_watcher::Snapshot;

/// Called with the outcome of every sync the scheduler started.
pub type OutcomeHook = Arc<dyn Fn(&SyncOutcome) + Send + Sync>;

/// Manual triggers buffered while the loop is busy.
const TRIGGER_BUFFER: usize = 4;

/// Why a sync was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Debounce,
    Interval,
    Manual,
}

/// Handle to a running scheduler.
pub struct AutoSync {
    triggers: mpsc::Sender<()>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl AutoSync {
    /// Start the scheduler.
    ///
    /// `snapshots` drives the debounce: every new snapshot pushes the
    /// deadline out by `config.debounce()`. The first periodic sync happens
    /// one interval after start.
    #[must_use]
    pub fn spawn(
        mirror: Arc<FolderMirror>,
        snapshots: watch::Receiver<Snapshot>,
        config: &SyncConfig,
        on_outcome: OutcomeHook,
    ) -> Self {
        let (triggers, trigger_rx) = mpsc::channel(TRIGGER_BUFFER);
        let (shutdown, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run(
            mirror,
            snapshots,
            config.debounce(),
            config.interval(),
            trigger_rx,
            shutdown_rx,
            on_outcome,
        ));

        tracing::info!(
            debounce_ms = config.debounce_ms,
            interval_secs = config.interval_secs,
            "Auto-sync started"
        );

        Self {
            triggers,
            shutdown: Some(shutdown),
            task,
        }
    }

    /// Request a sync now. Dropped if the trigger buffer is full.
    pub fn trigger(&self) {
        if self.triggers.try_send(()).is_err() {
            tracing::debug!("Manual sync trigger dropped");
        }
    }

    /// Stop scheduling and wait for syncs already started.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Auto-sync task ended abnormally");
        }
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        if self.shutdown.is_some() {
            self.task.abort();
        }
    }
}

async fn run(
    mirror: Arc<FolderMirror>,
    mut snapshots: watch::Receiver<Snapshot>,
    debounce: Duration,
    period: Duration,
    mut triggers: mpsc::Receiver<()>,
    mut shutdown: oneshot::Receiver<()>,
    on_outcome: OutcomeHook,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    let mut deadline: Option<Instant> = None;
    let mut watching = true;
    let mut running = JoinSet::new();

    loop {
        let trigger = tokio::select! {
            changed = snapshots.changed(), if watching => {
                if changed.is_ok() {
                    deadline = Some(Instant::now() + debounce);
                } else {
                    watching = false;
                }
                None
            }
            () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                deadline = None;
                Some(Trigger::Debounce)
            }
            _ = interval.tick() => Some(Trigger::Interval),
            Some(()) = triggers.recv() => Some(Trigger::Manual),
            Some(_) = running.join_next(), if !running.is_empty() => None,
            _ = &mut shutdown => break,
        };

        if let Some(trigger) = trigger {
            tracing::debug!(?trigger, "Starting sync");
            let snapshot = Arc::clone(&snapshots.borrow());
            let mirror = mirror.clone();
            let on_outcome = on_outcome.clone();
            running.spawn(async move {
                let outcome = mirror.sync(&snapshot).await;
                on_outcome(&outcome);
            });
        }
    }

    while running.join_next().await.is_some() {}
    tracing::info!("Auto-sync stopped");
}
