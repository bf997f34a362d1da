//! Drag-and-drop reordering within one folder.
//!
//! Gesture events go through the `GestureTracker`; only the drop touches the
//! store. The sibling array is read fresh at drop time, so a drop that raced
//! with another change becomes a no-op instead of a wrong move.

use std::sync::Arc;

use crate::domain::{
    translate_drop, BookmarkNode, BookmarkStore, DropIntent, GestureId, GestureTracker,
    MoveDestination, NodeKind, Placement, Release, Result,
};

/// What a drop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Exactly one move was issued.
    Moved {
        node: BookmarkNode,
        placement: Placement,
    },
    /// Released with no valid target.
    Cancelled,
    /// Gesture, source or target no longer current.
    Stale,
}

/// Reorders the children of one folder.
pub struct ReorderEngine {
    store: Arc<dyn BookmarkStore>,
    folder_id: String,
    tracker: GestureTracker,
}

impl ReorderEngine {
    #[must_use]
    pub fn new(store: Arc<dyn BookmarkStore>, folder_id: impl Into<String>) -> Self {
        Self {
            store,
            folder_id: folder_id.into(),
            tracker: GestureTracker::new(),
        }
    }

    #[must_use]
    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    pub fn drag_start(&mut self, id: &str, kind: NodeKind) -> GestureId {
        self.tracker.start(id, kind)
    }

    pub fn hover(
        &mut self,
        gesture: GestureId,
        target_id: &str,
        target_kind: NodeKind,
        intent: DropIntent,
    ) -> bool {
        self.tracker.hover(gesture, target_id, target_kind, intent)
    }

    pub fn leave(&mut self, gesture: GestureId, target_id: &str) {
        self.tracker.leave(gesture, target_id);
    }

    pub fn cancel(&mut self, gesture: GestureId) {
        self.tracker.cancel(gesture);
    }

    /// Finish the gesture and issue at most one move.
    ///
    /// The gesture is back to idle whatever the outcome.
    ///
    /// # Errors
    /// Returns error if reading the siblings or the move itself fails.
    pub async fn drop(&mut self, gesture: GestureId) -> Result<DropOutcome> {
        let (source, target) = match self.tracker.release(gesture) {
            None => return Ok(DropOutcome::Stale),
            Some(Release::Cancelled) => return Ok(DropOutcome::Cancelled),
            Some(Release::Drop { source, target }) => (source, target),
        };

        let siblings = self.store.get_children(&self.folder_id).await?;

        let Some(placement) = translate_drop(&siblings, &source.id, &target.id, target.intent)
        else {
            tracing::debug!(
                source = %source.id,
                target = %target.id,
                "Drop target or source no longer in folder"
            );
            return Ok(DropOutcome::Stale);
        };

        let destination = match &placement {
            Placement::At(index) => MoveDestination {
                parent_id: self.folder_id.clone(),
                index: Some(*index),
            },
            Placement::Into(folder) => MoveDestination {
                parent_id: folder.clone(),
                index: None,
            },
        };

        let node = self.store.move_node(&source.id, destination).await?;
        tracing::info!(
            id = %source.id,
            target = %target.id,
            intent = %target.intent,
            "Reordered bookmark"
        );

        Ok(DropOutcome::Moved { node, placement })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CreateDetails;
    use crate::infrastructure::SqliteBookmarkStore;

    async fn titles(store: &SqliteBookmarkStore, folder: &str) -> Vec<String> {
        store
            .get_children(folder)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect()
    }

    /// Folder "2" holding the given children; names starting with "Folder"
    /// become folders.
    async fn setup(names: &[&str]) -> (Arc<SqliteBookmarkStore>, Vec<BookmarkNode>) {
        let store = Arc::new(SqliteBookmarkStore::open_in_memory().unwrap());
        let mut nodes = Vec::new();
        for name in names {
            let details = if name.starts_with("Folder") {
                CreateDetails::folder("2", *name)
            } else {
                CreateDetails::link("2", *name, format!("https://{name}.example"))
            };
            nodes.push(store.create(details).await.unwrap());
        }
        (store, nodes)
    }

    #[tokio::test]
    async fn test_drag_link_before_first() {
        let (store, nodes) = setup(&["LinkA", "FolderB", "LinkC"]).await;
        let mut engine = ReorderEngine::new(store.clone(), "2");

        let g = engine.drag_start(&nodes[2].id, NodeKind::Link);
        assert!(engine.hover(g, &nodes[0].id, NodeKind::Link, DropIntent::Before));
        let outcome = engine.drop(g).await.unwrap();

        assert!(matches!(outcome, DropOutcome::Moved { placement: Placement::At(0), .. }));
        assert_eq!(titles(&store, "2").await, ["LinkC", "LinkA", "FolderB"]);
    }

    #[tokio::test]
    async fn test_drag_folder_after_last() {
        let (store, nodes) = setup(&["FolderB", "LinkA", "LinkC"]).await;
        let mut engine = ReorderEngine::new(store.clone(), "2");

        let g = engine.drag_start(&nodes[0].id, NodeKind::Folder);
        engine.hover(g, &nodes[2].id, NodeKind::Link, DropIntent::After);
        let outcome = engine.drop(g).await.unwrap();

        assert!(matches!(outcome, DropOutcome::Moved { placement: Placement::At(2), .. }));
        assert_eq!(titles(&store, "2").await, ["LinkA", "LinkC", "FolderB"]);
    }

    #[tokio::test]
    async fn test_drop_into_folder() {
        let (store, nodes) = setup(&["LinkA", "FolderB"]).await;
        let mut engine = ReorderEngine::new(store.clone(), "2");

        let g = engine.drag_start(&nodes[0].id, NodeKind::Link);
        engine.hover(g, &nodes[1].id, NodeKind::Folder, DropIntent::Into);
        engine.drop(g).await.unwrap();

        assert_eq!(titles(&store, "2").await, ["FolderB"]);
        assert_eq!(titles(&store, &nodes[1].id).await, ["LinkA"]);
    }

    #[tokio::test]
    async fn test_target_removed_before_drop_is_stale() {
        let (store, nodes) = setup(&["LinkA", "LinkB", "LinkC"]).await;
        let mut engine = ReorderEngine::new(store.clone(), "2");

        let g = engine.drag_start(&nodes[2].id, NodeKind::Link);
        engine.hover(g, &nodes[0].id, NodeKind::Link, DropIntent::Before);
        store.remove(&nodes[0].id).await.unwrap();

        assert_eq!(engine.drop(g).await.unwrap(), DropOutcome::Stale);
        assert_eq!(titles(&store, "2").await, ["LinkB", "LinkC"]);
    }

    #[tokio::test]
    async fn test_cancel_and_stale_gestures_do_not_move() {
        let (store, nodes) = setup(&["LinkA", "LinkB"]).await;
        let mut engine = ReorderEngine::new(store.clone(), "2");

        let g = engine.drag_start(&nodes[1].id, NodeKind::Link);
        assert_eq!(engine.drop(g).await.unwrap(), DropOutcome::Cancelled);

        let old = engine.drag_start(&nodes[1].id, NodeKind::Link);
        engine.hover(old, &nodes[0].id, NodeKind::Link, DropIntent::Before);
        let new = engine.drag_start(&nodes[0].id, NodeKind::Link);
        assert_eq!(engine.drop(old).await.unwrap(), DropOutcome::Stale);

        engine.cancel(new);
        assert_eq!(engine.drop(new).await.unwrap(), DropOutcome::Stale);
        assert_eq!(titles(&store, "2").await, ["LinkA", "LinkB"]);
    }
}
