//! SQLite-backed bookmark store.
//!
//! Keeps the tree in one `nodes` table with a dense `position` per parent and
//! follows browser bookmark semantics: fixed base folders, links are nodes
//! with a URL, moves remove before inserting.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::broadcast;

use crate::domain::{
    AppError, BookmarkNode, BookmarkStore, CreateDetails, MoveDestination, NodeChanges, Result,
    SearchQuery, StoreEvent,
};

/// Buffered notifications per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

/// Ids of the base folders: root, "Bookmarks Bar", "Other Bookmarks".
const BASE_FOLDER_IDS: [i64; 3] = [0, 1, 2];

const NODE_COLUMNS: &str = "id, parent_id, position, title, url, date_added";

/// Bookmark store persisted in SQLite.
pub struct SqliteBookmarkStore {
    conn: Mutex<Connection>,
    events: broadcast::Sender<StoreEvent>,
}

impl SqliteBookmarkStore {
    /// Opens or creates the store database.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or schema creation fails.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create storage directory", e))?;
        }

        let conn = Connection::open(path).map_err(AppError::store)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(AppError::store)?;

        Self::with_connection(conn)
    }

    /// Opens a throwaway in-memory store.
    ///
    /// # Errors
    /// Returns error if schema creation fails.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(AppError::store)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(AppError::store)?;
        init_schema(&conn)?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            conn: Mutex::new(conn),
            events,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| AppError::Store {
            message: "store connection lock poisoned".into(),
            source: None,
        })
    }

    fn notify(&self, event: StoreEvent) {
        tracing::trace!(?event, "Store changed");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Initialize database schema and seed the base folders.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS nodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_id INTEGER REFERENCES nodes(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            title TEXT NOT NULL DEFAULT '',
            url TEXT,
            date_added TEXT
        );

        INSERT OR IGNORE INTO nodes (id, parent_id, position, title) VALUES
            (0, NULL, 0, ''),
            (1, 0, 0, 'Bookmarks Bar'),
            (2, 0, 1, 'Other Bookmarks');

        CREATE INDEX IF NOT EXISTS idx_nodes_parent
            ON nodes(parent_id, position);
        CREATE INDEX IF NOT EXISTS idx_nodes_title
            ON nodes(title);
        ",
    )
    .map_err(AppError::store)?;

    Ok(())
}

/// Convert a row to a node (children not loaded).
fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<BookmarkNode> {
    let id: i64 = row.get(0)?;
    let parent_id: Option<i64> = row.get(1)?;
    let position: i64 = row.get(2)?;
    let date_added: Option<String> = row.get(5)?;

    Ok(BookmarkNode {
        id: id.to_string(),
        parent_id: parent_id.map(|p| p.to_string()),
        index: usize::try_from(position).unwrap_or_default(),
        title: row.get(3)?,
        url: row.get(4)?,
        date_added: date_added
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
        children: None,
    })
}

/// Store ids are integers; anything else cannot exist.
fn parse_id(id: &str) -> Result<i64> {
    id.parse().map_err(|_| AppError::not_found(id))
}

fn find_node(conn: &Connection, id: i64) -> Result<Option<BookmarkNode>> {
    conn.prepare_cached(&format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1"))
        .map_err(AppError::store)?
        .query_row([id], row_to_node)
        .optional()
        .map_err(AppError::store)
}

fn get_node(conn: &Connection, id: i64) -> Result<BookmarkNode> {
    find_node(conn, id)?.ok_or_else(|| AppError::not_found(id.to_string()))
}

fn get_folder(conn: &Connection, id: i64) -> Result<BookmarkNode> {
    let node = get_node(conn, id)?;
    if !node.is_folder() {
        return Err(AppError::invalid_operation(format!(
            "node {id} is a bookmark, not a folder"
        )));
    }
    Ok(node)
}

fn child_nodes(conn: &Connection, parent_id: i64) -> Result<Vec<BookmarkNode>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE parent_id = ?1 ORDER BY position ASC"
        ))
        .map_err(AppError::store)?;

    let rows = stmt
        .query_map([parent_id], row_to_node)
        .map_err(AppError::store)?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(AppError::store)
}

fn load_subtree(conn: &Connection, mut node: BookmarkNode) -> Result<BookmarkNode> {
    if node.is_folder() {
        let id = parse_id(&node.id)?;
        let children = child_nodes(conn, id)?
            .into_iter()
            .map(|child| load_subtree(conn, child))
            .collect::<Result<Vec<_>>>()?;
        node.children = Some(children);
    }
    Ok(node)
}

fn child_count(conn: &Connection, parent_id: i64, excluding: Option<i64>) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM nodes WHERE parent_id = ?1 AND id IS NOT ?2",
            params![parent_id, excluding],
            |row| row.get(0),
        )
        .map_err(AppError::store)?;
    Ok(usize::try_from(count).unwrap_or_default())
}

/// Close the gap left at `position` under `parent_id`.
fn close_gap(conn: &Connection, parent_id: i64, position: i64, excluding: i64) -> Result<()> {
    conn.execute(
        "UPDATE nodes SET position = position - 1
         WHERE parent_id = ?1 AND position > ?2 AND id != ?3",
        params![parent_id, position, excluding],
    )
    .map_err(AppError::store)?;
    Ok(())
}

/// Make room at `position` under `parent_id`.
fn open_gap(conn: &Connection, parent_id: i64, position: i64, excluding: Option<i64>) -> Result<()> {
    conn.execute(
        "UPDATE nodes SET position = position + 1
         WHERE parent_id = ?1 AND position >= ?2 AND id IS NOT ?3",
        params![parent_id, position, excluding],
    )
    .map_err(AppError::store)?;
    Ok(())
}

fn ensure_mutable(id: i64) -> Result<()> {
    if BASE_FOLDER_IDS.contains(&id) {
        return Err(AppError::invalid_operation(format!(
            "base folder {id} cannot be modified"
        )));
    }
    Ok(())
}

fn to_position(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

#[async_trait]
impl BookmarkStore for SqliteBookmarkStore {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<BookmarkNode>> {
        let conn = self.lock()?;

        let (sql, needle) = match query {
            SearchQuery::Title(title) => (
                format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id != 0 AND title = ?1 ORDER BY id"),
                title.as_str(),
            ),
            SearchQuery::Text(text) => (
                format!(
                    "SELECT {NODE_COLUMNS} FROM nodes
                     WHERE id != 0
                       AND (instr(lower(title), lower(?1)) > 0
                            OR instr(lower(COALESCE(url, '')), lower(?1)) > 0)
                     ORDER BY id"
                ),
                text.as_str(),
            ),
        };

        let mut stmt = conn.prepare(&sql).map_err(AppError::store)?;
        let rows = stmt
            .query_map([needle], row_to_node)
            .map_err(AppError::store)?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(AppError::store)
    }

    async fn get(&self, id: &str) -> Result<BookmarkNode> {
        let conn = self.lock()?;
        get_node(&conn, parse_id(id)?)
    }

    async fn get_subtree(&self, id: &str) -> Result<BookmarkNode> {
        let conn = self.lock()?;
        let node = get_node(&conn, parse_id(id)?)?;
        load_subtree(&conn, node)
    }

    async fn create(&self, details: CreateDetails) -> Result<BookmarkNode> {
        let parent_id = parse_id(&details.parent_id)?;
        let url = details.url.filter(|u| !u.is_empty());

        let node = {
            let mut conn = self.lock()?;
            let tx = conn.transaction().map_err(AppError::store)?;

            get_folder(&tx, parent_id)?;
            let len = child_count(&tx, parent_id, None)?;
            let position = to_position(details.index.map_or(len, |i| i.min(len)));

            open_gap(&tx, parent_id, position, None)?;
            tx.execute(
                "INSERT INTO nodes (parent_id, position, title, url, date_added)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    parent_id,
                    position,
                    &details.title,
                    &url,
                    Utc::now().to_rfc3339()
                ],
            )
            .map_err(AppError::store)?;

            let node = get_node(&tx, tx.last_insert_rowid())?;
            tx.commit().map_err(AppError::store)?;
            node
        };

        tracing::debug!(id = %node.id, parent = %details.parent_id, "Created node");
        self.notify(StoreEvent::Created {
            id: node.id.clone(),
        });
        Ok(node)
    }

    async fn update(&self, id: &str, changes: NodeChanges) -> Result<BookmarkNode> {
        let node_id = parse_id(id)?;

        let node = {
            let conn = self.lock()?;
            ensure_mutable(node_id)?;
            let current = get_node(&conn, node_id)?;

            if changes.url.is_some() && current.is_folder() {
                return Err(AppError::invalid_operation("cannot set the URL of a folder"));
            }

            conn.execute(
                "UPDATE nodes SET title = COALESCE(?2, title), url = COALESCE(?3, url)
                 WHERE id = ?1",
                params![node_id, &changes.title, &changes.url],
            )
            .map_err(AppError::store)?;

            get_node(&conn, node_id)?
        };

        self.notify(StoreEvent::Changed { id: id.to_string() });
        Ok(node)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let node_id = parse_id(id)?;

        {
            let mut conn = self.lock()?;
            let tx = conn.transaction().map_err(AppError::store)?;
            ensure_mutable(node_id)?;
            let node = get_node(&tx, node_id)?;

            if node.is_folder() && child_count(&tx, node_id, None)? > 0 {
                return Err(AppError::invalid_operation(format!(
                    "folder {id} is not empty"
                )));
            }

            remove_row(&tx, &node, node_id)?;
            tx.commit().map_err(AppError::store)?;
        }

        self.notify(StoreEvent::Removed { id: id.to_string() });
        Ok(())
    }

    async fn remove_tree(&self, id: &str) -> Result<()> {
        let node_id = parse_id(id)?;

        {
            let mut conn = self.lock()?;
            let tx = conn.transaction().map_err(AppError::store)?;
            ensure_mutable(node_id)?;
            let node = get_node(&tx, node_id)?;

            remove_row(&tx, &node, node_id)?;
            tx.commit().map_err(AppError::store)?;
        }

        self.notify(StoreEvent::Removed { id: id.to_string() });
        Ok(())
    }

    async fn move_node(&self, id: &str, destination: MoveDestination) -> Result<BookmarkNode> {
        let node_id = parse_id(id)?;
        let new_parent = parse_id(&destination.parent_id)?;

        let node = {
            let mut conn = self.lock()?;
            let tx = conn.transaction().map_err(AppError::store)?;
            ensure_mutable(node_id)?;

            let node = get_node(&tx, node_id)?;
            get_folder(&tx, new_parent)?;

            // The new parent must not be the node or one of its descendants.
            let mut cursor = Some(new_parent);
            while let Some(current) = cursor {
                if current == node_id {
                    return Err(AppError::invalid_operation(format!(
                        "cannot move {id} into itself or its own subfolder"
                    )));
                }
                cursor = tx
                    .query_row(
                        "SELECT parent_id FROM nodes WHERE id = ?1",
                        [current],
                        |row| row.get::<_, Option<i64>>(0),
                    )
                    .map_err(AppError::store)?;
            }

            if let Some(old_parent) = node.parent_id.as_deref() {
                close_gap(&tx, parse_id(old_parent)?, to_position(node.index), node_id)?;
            }

            let len = child_count(&tx, new_parent, Some(node_id))?;
            let position = to_position(destination.index.map_or(len, |i| i.min(len)));

            open_gap(&tx, new_parent, position, Some(node_id))?;
            tx.execute(
                "UPDATE nodes SET parent_id = ?2, position = ?3 WHERE id = ?1",
                params![node_id, new_parent, position],
            )
            .map_err(AppError::store)?;

            let moved = get_node(&tx, node_id)?;
            tx.commit().map_err(AppError::store)?;
            moved
        };

        tracing::debug!(
            id,
            parent = %destination.parent_id,
            index = node.index,
            "Moved node"
        );
        self.notify(StoreEvent::Moved { id: id.to_string() });
        Ok(node)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// Delete a node (children cascade) and close the gap it leaves.
fn remove_row(conn: &Connection, node: &BookmarkNode, node_id: i64) -> Result<()> {
    conn.execute("DELETE FROM nodes WHERE id = ?1", [node_id])
        .map_err(AppError::store)?;

    if let Some(parent) = node.parent_id.as_deref() {
        close_gap(conn, parse_id(parent)?, to_position(node.index), node_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn children_titles(store: &SqliteBookmarkStore, id: &str) -> Vec<String> {
        store
            .get_children(id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect()
    }

    async fn seed(store: &SqliteBookmarkStore, parent: &str, titles: &[&str]) -> Vec<BookmarkNode> {
        let mut out = Vec::new();
        for title in titles {
            let details = if title.starts_with('F') {
                CreateDetails::folder(parent, *title)
            } else {
                CreateDetails::link(parent, *title, format!("https://{title}.example"))
            };
            out.push(store.create(details).await.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_open_seeds_base_folders() {
        let dir = tempdir().unwrap();
        let store = SqliteBookmarkStore::open(&dir.path().join("test.db")).unwrap();

        assert_eq!(
            children_titles(&store, "0").await,
            ["Bookmarks Bar", "Other Bookmarks"]
        );
        assert!(store.get("2").await.unwrap().is_folder());
    }

    #[tokio::test]
    async fn test_create_appends_and_inserts() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();
        seed(&store, "2", &["a", "b"]).await;

        let mut details = CreateDetails::link("2", "first", "https://first.example");
        details.index = Some(0);
        store.create(details).await.unwrap();

        assert_eq!(children_titles(&store, "2").await, ["first", "a", "b"]);
        let indexes: Vec<usize> = store
            .get_children("2")
            .await
            .unwrap()
            .iter()
            .map(|n| n.index)
            .collect();
        assert_eq!(indexes, [0, 1, 2]);
    }

    #[tokio::test]
    async fn test_move_removes_before_inserting() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();
        let nodes = seed(&store, "2", &["FolderB", "LinkA", "LinkC"]).await;

        store
            .move_node(
                &nodes[0].id,
                MoveDestination {
                    parent_id: "2".into(),
                    index: Some(2),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            children_titles(&store, "2").await,
            ["LinkA", "LinkC", "FolderB"]
        );
    }

    #[tokio::test]
    async fn test_move_into_folder_appends() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();
        let nodes = seed(&store, "2", &["a", "F1", "b"]).await;
        seed(&store, &nodes[1].id, &["inner"]).await;

        store
            .move_node(
                &nodes[0].id,
                MoveDestination {
                    parent_id: nodes[1].id.clone(),
                    index: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(children_titles(&store, "2").await, ["F1", "b"]);
        assert_eq!(children_titles(&store, &nodes[1].id).await, ["inner", "a"]);
        assert_eq!(store.get("2").await.unwrap().index, 1);
    }

    #[tokio::test]
    async fn test_move_into_own_descendant_is_rejected() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();
        let outer = seed(&store, "2", &["F-outer"]).await.remove(0);
        let inner = seed(&store, &outer.id, &["F-inner"]).await.remove(0);

        let err = store
            .move_node(
                &outer.id,
                MoveDestination {
                    parent_id: inner.id.clone(),
                    index: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOperation { .. }));
    }

    #[tokio::test]
    async fn test_remove_rules() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();
        let nodes = seed(&store, "2", &["F1", "x", "y"]).await;
        seed(&store, &nodes[0].id, &["inner"]).await;

        assert!(store.remove(&nodes[0].id).await.is_err());
        assert!(store.remove_tree("2").await.is_err());

        store.remove(&nodes[1].id).await.unwrap();
        assert_eq!(children_titles(&store, "2").await, ["F1", "y"]);

        store.remove_tree(&nodes[0].id).await.unwrap();
        assert_eq!(children_titles(&store, "2").await, ["y"]);
        assert_eq!(store.get_children("2").await.unwrap()[0].index, 0);
        assert!(store.search(&SearchQuery::Title("inner".into())).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_search() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();
        let nodes = seed(&store, "2", &["F1", "rust"]).await;

        let updated = store
            .update(
                &nodes[1].id,
                NodeChanges {
                    title: Some("Rust Lang".into()),
                    url: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Rust Lang");
        assert_eq!(updated.url.as_deref(), Some("https://rust.example"));

        let folder_url = store
            .update(
                &nodes[0].id,
                NodeChanges {
                    title: None,
                    url: Some("https://x.example".into()),
                },
            )
            .await;
        assert!(folder_url.is_err());

        let hits = store.search(&SearchQuery::Text("RUST".into())).await.unwrap();
        assert_eq!(hits.len(), 1);
        let exact = store.search(&SearchQuery::Title("F1".into())).await.unwrap();
        assert_eq!(exact.len(), 1);
    }

    #[tokio::test]
    async fn test_mutations_notify_subscribers() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();
        let mut events = store.subscribe();

        let node = store.create(CreateDetails::folder("2", "F")).await.unwrap();
        store.remove(&node.id).await.unwrap();

        assert_eq!(events.recv().await.unwrap(), StoreEvent::Created { id: node.id.clone() });
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Removed { id: node.id });
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();
        assert!(matches!(
            store.get("not-a-number").await,
            Err(AppError::NodeNotFound { .. })
        ));
        assert!(matches!(
            store.get_subtree("999").await,
            Err(AppError::NodeNotFound { .. })
        ));
    }
}
