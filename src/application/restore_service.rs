//! Restore service for imported backups.
//!
//! Replaces the managed root's contents with a validated document. The
//! replacement is delete-then-recreate and not transactional: a store failure
//! midway leaves whatever was written so far and is reported as an error.

use std::sync::Arc;

use crate::domain::{BookmarkStore, CreateDetails, ExportGroup, Result};

use super::import_validator::SanitizedDocument;
use super::tree_loader::get_or_create_root;

/// Service for replaying backups into the bookmark store.
pub struct RestoreService {
    store: Arc<dyn BookmarkStore>,
}

impl RestoreService {
    /// Create a new restore service.
    #[must_use]
    pub fn new(store: Arc<dyn BookmarkStore>) -> Self {
        Self { store }
    }

    /// Restore into the managed root, creating it if needed.
    ///
    /// # Errors
    /// Returns error if any store call fails.
    pub async fn restore(&self, doc: SanitizedDocument) -> Result<RestoreResult> {
        let root = get_or_create_root(self.store.as_ref()).await?;
        self.restore_into(&root.id, doc).await
    }

    /// Remove every child of `root_id`, then recreate the document under it
    /// depth-first in document order.
    ///
    /// # Errors
    /// Returns error if any store call fails; earlier changes are kept.
    pub async fn restore_into(&self, root_id: &str, doc: SanitizedDocument) -> Result<RestoreResult> {
        let doc = doc.into_inner();

        tracing::info!(
            root = root_id,
            groups = doc.group_count(),
            items = doc.item_count(),
            "Starting restore"
        );

        let mut result = RestoreResult::default();

        for child in self.store.get_children(root_id).await? {
            self.store.remove_tree(&child.id).await?;
            result.removed_nodes += 1;
        }

        self.create_groups(root_id, &doc.data, &mut result).await?;

        tracing::info!(
            removed = result.removed_nodes,
            groups = result.created_groups,
            items = result.created_items,
            "Restore completed"
        );

        Ok(result)
    }

    async fn create_groups(
        &self,
        parent_id: &str,
        groups: &[ExportGroup],
        result: &mut RestoreResult,
    ) -> Result<()> {
        for group in groups {
            let folder = self
                .store
                .create(CreateDetails::folder(parent_id, group.title.as_str()))
                .await?;
            result.created_groups += 1;

            for item in &group.items {
                self.store
                    .create(CreateDetails::link(
                        folder.id.as_str(),
                        item.title.as_str(),
                        item.url.as_str(),
                    ))
                    .await?;
                result.created_items += 1;
            }

            Box::pin(self.create_groups(&folder.id, &group.children, result)).await?;
        }
        Ok(())
    }
}

/// Result of a restore operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreResult {
    /// Top-level nodes removed from the root.
    pub removed_nodes: usize,
    /// Folders created at every level.
    pub created_groups: usize,
    /// Links created at every level.
    pub created_items: usize,
}
