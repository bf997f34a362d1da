//! Port to the external bookmark store.
//!
//! The store owns the tree: ids, parents and the mixed sibling order. This
//! crate only reads snapshots from it and issues single mutating calls.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::error::Result;
use super::models::BookmarkNode;

/// Change notification emitted after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created { id: String },
    Removed { id: String },
    Changed { id: String },
    Moved { id: String },
}

impl StoreEvent {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Created { id } | Self::Removed { id } | Self::Changed { id } | Self::Moved { id } => {
                id
            }
        }
    }
}

/// Search criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Nodes whose title is exactly this string.
    Title(String),
    /// Nodes whose title or URL contains this string (case-insensitive).
    Text(String),
}

/// Arguments for creating a node. A `url` makes it a link.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateDetails {
    pub parent_id: String,
    pub title: String,
    pub url: Option<String>,
    /// Insert position; appended when absent.
    pub index: Option<usize>,
}

impl CreateDetails {
    #[must_use]
    pub fn folder(parent_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn link(
        parent_id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: parent_id.into(),
            title: title.into(),
            url: Some(url.into()),
            index: None,
        }
    }
}

/// Fields to change on an existing node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeChanges {
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Destination of a move.
///
/// The store removes the node from its current position first and then
/// inserts it at `index` (clamped, appended when absent) under `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDestination {
    pub parent_id: String,
    pub index: Option<usize>,
}

/// The external hierarchical bookmark store.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<BookmarkNode>>;

    /// A single node without children.
    async fn get(&self, id: &str) -> Result<BookmarkNode>;

    /// A node with its whole subtree in store order.
    async fn get_subtree(&self, id: &str) -> Result<BookmarkNode>;

    async fn create(&self, details: CreateDetails) -> Result<BookmarkNode>;

    async fn update(&self, id: &str, changes: NodeChanges) -> Result<BookmarkNode>;

    /// Remove a link or an empty folder.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Remove a node and everything under it.
    async fn remove_tree(&self, id: &str) -> Result<()>;

    async fn move_node(&self, id: &str, destination: MoveDestination) -> Result<BookmarkNode>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;

    /// Direct children of a folder: the external sibling array.
    async fn get_children(&self, id: &str) -> Result<Vec<BookmarkNode>> {
        let node = self.get_subtree(id).await?;
        Ok(node
            .children
            .unwrap_or_default()
            .into_iter()
            .map(|mut child| {
                child.children = None;
                child
            })
            .collect())
    }
}
