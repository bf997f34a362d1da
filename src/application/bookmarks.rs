//! Bookmark and group operations.
//!
//! Thin use cases over the bookmark store. Group ids may name the synthetic
//! ungrouped folder, which stands for the managed root itself.

use std::sync::Arc;

use crate::domain::{
    find_group_by_id, find_group_for_item, AppError, BookmarkNode, BookmarkStore, CreateDetails,
    Group, MoveDestination, NodeChanges, Result, SearchQuery, UNGROUPED_ID,
};

use super::import_validator::is_allowed_url;
use super::tree_loader::{get_or_create_root, load_groups};

/// A search match inside the managed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub node: BookmarkNode,
    /// Group holding the node (the parent group for a folder).
    pub group_id: String,
}

/// Service for editing the managed tree.
pub struct BookmarkService {
    store: Arc<dyn BookmarkStore>,
}

impl BookmarkService {
    #[must_use]
    pub fn new(store: Arc<dyn BookmarkStore>) -> Self {
        Self { store }
    }

    /// Current tree snapshot.
    ///
    /// # Errors
    /// Returns error if the store cannot be read.
    pub async fn groups(&self) -> Result<Vec<Group>> {
        load_groups(self.store.as_ref()).await
    }

    /// Create a folder under `parent_id`, or at the top level when absent.
    ///
    /// # Errors
    /// Returns error if the parent does not exist or the store call fails.
    pub async fn create_group(&self, title: &str, parent_id: Option<&str>) -> Result<BookmarkNode> {
        let parent = match parent_id {
            Some(id) => self.resolve_group(id).await?,
            None => get_or_create_root(self.store.as_ref()).await?.id,
        };

        let node = self
            .store
            .create(CreateDetails::folder(parent.as_str(), title))
            .await?;
        tracing::info!(id = %node.id, parent = %parent, "Created group");
        Ok(node)
    }

    /// # Errors
    /// Returns error for the ungrouped folder or if the store call fails.
    pub async fn rename_group(&self, id: &str, title: &str) -> Result<BookmarkNode> {
        Self::reject_ungrouped(id)?;
        self.store
            .update(
                id,
                NodeChanges {
                    title: Some(title.to_string()),
                    url: None,
                },
            )
            .await
    }

    /// Delete a group and everything in it.
    ///
    /// # Errors
    /// Returns error for the ungrouped folder or if the store call fails.
    pub async fn delete_group(&self, id: &str) -> Result<()> {
        Self::reject_ungrouped(id)?;
        self.store.remove_tree(id).await?;
        tracing::info!(id, "Deleted group");
        Ok(())
    }

    /// Add a link to a group.
    ///
    /// # Errors
    /// Returns `InvalidData` for a URL outside the allowed schemes, or the
    /// store error.
    pub async fn add_bookmark(&self, group_id: &str, title: &str, url: &str) -> Result<BookmarkNode> {
        Self::check_url(url)?;
        let parent = self.resolve_group(group_id).await?;

        let node = self
            .store
            .create(CreateDetails::link(parent.as_str(), title, url))
            .await?;
        tracing::info!(id = %node.id, parent = %parent, "Added bookmark");
        Ok(node)
    }

    /// # Errors
    /// Returns error if the node is a folder or the store call fails.
    pub async fn remove_bookmark(&self, id: &str) -> Result<()> {
        let node = self.store.get(id).await?;
        if node.is_folder() {
            return Err(AppError::invalid_operation(format!(
                "{id} is a group; delete it as a group"
            )));
        }
        self.store.remove(id).await
    }

    /// Change a link's title and/or URL.
    ///
    /// # Errors
    /// Returns `InvalidData` for a disallowed URL, or the store error.
    pub async fn update_bookmark(&self, id: &str, changes: NodeChanges) -> Result<BookmarkNode> {
        if let Some(url) = changes.url.as_deref() {
            Self::check_url(url)?;
        }
        self.store.update(id, changes).await
    }

    /// Move a link into a group at `index` (appended when absent).
    ///
    /// # Errors
    /// Returns error if the node is not a link or the store rejects the move.
    pub async fn move_bookmark(
        &self,
        id: &str,
        group_id: &str,
        index: Option<usize>,
    ) -> Result<BookmarkNode> {
        if self.store.get(id).await?.is_folder() {
            return Err(AppError::invalid_operation(format!("{id} is not a bookmark")));
        }
        self.move_to(id, group_id, index).await
    }

    /// Move a group under another group at `index` (appended when absent).
    ///
    /// # Errors
    /// Returns error if the node is not a folder or the store rejects the
    /// move (for example a move into its own subtree).
    pub async fn move_group(
        &self,
        id: &str,
        parent_id: &str,
        index: Option<usize>,
    ) -> Result<BookmarkNode> {
        Self::reject_ungrouped(id)?;
        if !self.store.get(id).await?.is_folder() {
            return Err(AppError::invalid_operation(format!("{id} is not a group")));
        }
        self.move_to(id, parent_id, index).await
    }

    /// Move a link or a group into `group_id`, by the node's kind.
    ///
    /// # Errors
    /// Returns error if the node does not exist or the move is rejected.
    pub async fn move_into(
        &self,
        id: &str,
        group_id: &str,
        index: Option<usize>,
    ) -> Result<BookmarkNode> {
        if self.store.get(id).await?.is_folder() {
            self.move_group(id, group_id, index).await
        } else {
            self.move_bookmark(id, group_id, index).await
        }
    }

    /// Links and groups whose title or URL contains `text`, case-insensitive.
    /// Matches outside the managed tree are left out.
    ///
    /// # Errors
    /// Returns error if the store cannot be read.
    pub async fn search(&self, text: &str) -> Result<Vec<SearchHit>> {
        let groups = self.groups().await?;
        let nodes = self.store.search(&SearchQuery::Text(text.to_string())).await?;

        let hits: Vec<SearchHit> = nodes
            .into_iter()
            .filter_map(|node| {
                let group_id = if node.is_folder() {
                    find_group_by_id(&groups, &node.id).map(|g| g.parent_id.clone())
                } else {
                    find_group_for_item(&groups, &node.id).map(str::to_string)
                }?;
                Some(SearchHit { node, group_id })
            })
            .collect();

        tracing::debug!(text, hits = hits.len(), "Searched bookmarks");
        Ok(hits)
    }

    async fn move_to(&self, id: &str, group_id: &str, index: Option<usize>) -> Result<BookmarkNode> {
        let parent_id = self.resolve_group(group_id).await?;
        self.store
            .move_node(id, MoveDestination { parent_id, index })
            .await
    }

    /// Map a group id to a store folder id.
    async fn resolve_group(&self, id: &str) -> Result<String> {
        if id == UNGROUPED_ID {
            return Ok(get_or_create_root(self.store.as_ref()).await?.id);
        }
        Ok(id.to_string())
    }

    fn reject_ungrouped(id: &str) -> Result<()> {
        if id == UNGROUPED_ID {
            return Err(AppError::invalid_operation(
                "the ungrouped folder cannot be changed",
            ));
        }
        Ok(())
    }

    fn check_url(url: &str) -> Result<()> {
        if !is_allowed_url(url) {
            return Err(AppError::InvalidData {
                message: format!("URL not allowed: {url}"),
            });
        }
        Ok(())
    }
}
