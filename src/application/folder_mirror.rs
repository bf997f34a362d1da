//! Folder-mirror sync.
//!
//! Writes the export document of a tree snapshot into a user-granted
//! directory as `syncgrid-sync.json`. The directory capability has no rename, so the write
//! goes to a temp file first, then to the final name, and the temp file is
//! removed afterwards.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{Group, Permission, Result, SyncDirectory};

use super::export_codec::{export_data, to_pretty_json};

/// Name of the mirrored file inside the sync directory.
pub const SYNC_FILENAME: &str = "syncgrid-sync.json";

/// Name of the temp file written before the final one.
#[must_use]
pub fn temp_filename() -> String {
    format!("{SYNC_FILENAME}.tmp")
}

/// Result of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced { synced_at: DateTime<Utc> },
    /// Another write was in flight; this trigger was dropped.
    Coalesced,
    NoPermission,
    Failed { reason: String },
}

impl SyncOutcome {
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }
}

/// Mirrors the bookmark tree into one directory.
pub struct FolderMirror {
    directory: Arc<dyn SyncDirectory>,
    in_flight: Mutex<()>,
}

impl FolderMirror {
    #[must_use]
    pub fn new(directory: Arc<dyn SyncDirectory>) -> Self {
        Self {
            directory,
            in_flight: Mutex::new(()),
        }
    }

    /// Display name of the sync directory.
    #[must_use]
    pub fn directory_name(&self) -> &str {
        self.directory.name()
    }

    /// Write `groups` to the directory.
    ///
    /// Never queues: if a write is already running this returns `Coalesced`
    /// immediately.
    pub async fn sync(&self, groups: &[Group]) -> SyncOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("Sync already running, trigger coalesced");
            return SyncOutcome::Coalesced;
        };

        if !self.ensure_permission().await {
            tracing::warn!(
                directory = self.directory.name(),
                "Sync directory permission not granted"
            );
            return SyncOutcome::NoPermission;
        }

        match self.write_snapshot(groups).await {
            Ok(synced_at) => {
                tracing::info!(
                    directory = self.directory.name(),
                    %synced_at,
                    "Sync completed"
                );
                SyncOutcome::Synced { synced_at }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sync failed");
                SyncOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn ensure_permission(&self) -> bool {
        match self.directory.query_permission().await {
            Permission::Granted => true,
            Permission::Denied | Permission::Prompt => {
                self.directory.request_permission().await == Permission::Granted
            }
        }
    }

    async fn write_snapshot(&self, groups: &[Group]) -> Result<DateTime<Utc>> {
        let doc = export_data(groups)?;
        let json = to_pretty_json(&doc)?;

        let temp = temp_filename();
        self.directory.write_file(&temp, json.as_bytes()).await?;
        self.directory
            .write_file(SYNC_FILENAME, json.as_bytes())
            .await?;

        if let Err(e) = self.directory.remove_file(&temp).await {
            tracing::warn!(file = %temp, error = %e, "Failed to remove temp sync file");
        }

        Ok(Utc::now())
    }
}
