//! Tree loading service.
//!
//! Reads the managed root folder from the bookmark store and builds the
//! `Group` snapshot the rest of the application works with.

use crate::domain::{
    BookmarkNode, BookmarkStore, CreateDetails, Entry, Group, Item, Result, SearchQuery,
    ROOT_PARENT_ID, ROOT_TITLE, UNGROUPED_ID, UNGROUPED_TITLE,
};

/// Finds the managed root folder, creating it under "Other Bookmarks" when
/// it does not exist yet.
///
/// # Errors
/// Returns error if the store search or create call fails.
pub async fn get_or_create_root(store: &dyn BookmarkStore) -> Result<BookmarkNode> {
    let found = store
        .search(&SearchQuery::Title(ROOT_TITLE.to_string()))
        .await?
        .into_iter()
        .find(|node| node.is_folder() && node.title == ROOT_TITLE);

    if let Some(root) = found {
        return Ok(root);
    }

    tracing::info!(parent = ROOT_PARENT_ID, "Creating root folder");
    store
        .create(CreateDetails::folder(ROOT_PARENT_ID, ROOT_TITLE))
        .await
}

/// Loads the whole managed tree as top-level groups.
///
/// # Errors
/// Returns error if the store cannot be read.
pub async fn load_groups(store: &dyn BookmarkStore) -> Result<Vec<Group>> {
    let root = get_or_create_root(store).await?;
    let subtree = store.get_subtree(&root.id).await?;
    let groups = build_groups(&subtree);

    tracing::debug!(
        root = %root.id,
        groups = groups.len(),
        "Loaded bookmark tree"
    );

    Ok(groups)
}

/// Partitions a root subtree into groups.
///
/// Folders directly under the root become top-level groups (depth 0). Links
/// directly under the root are gathered into the ungrouped group, which is
/// appended last and only when it has something in it.
#[must_use]
pub fn build_groups(root: &BookmarkNode) -> Vec<Group> {
    let mut groups = Vec::new();
    let mut loose = Vec::new();

    for node in root.child_nodes() {
        match to_entry(node, &root.id, 0) {
            Entry::Folder(group) => groups.push(group),
            link @ Entry::Link(_) => loose.push(link),
        }
    }

    if !loose.is_empty() {
        groups.push(Group::new(
            UNGROUPED_ID,
            UNGROUPED_TITLE,
            root.id.as_str(),
            0,
            loose,
        ));
    }

    groups
}

fn to_entry(node: &BookmarkNode, parent_id: &str, depth: usize) -> Entry {
    match node.url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => Entry::Link(Item {
            id: node.id.clone(),
            title: node.title.clone(),
            url: url.to_string(),
            date_added: node.date_added,
            parent_id: parent_id.to_string(),
        }),
        None => {
            let entries = node
                .child_nodes()
                .iter()
                .map(|child| to_entry(child, &node.id, depth + 1))
                .collect();
            Entry::Folder(Group::new(
                node.id.as_str(),
                node.title.as_str(),
                parent_id,
                depth,
                entries,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::SqliteBookmarkStore;

    fn node(id: &str, title: &str, url: Option<&str>, children: Option<Vec<BookmarkNode>>) -> BookmarkNode {
        BookmarkNode {
            id: id.into(),
            parent_id: None,
            index: 0,
            title: title.into(),
            url: url.map(String::from),
            date_added: None,
            children,
        }
    }

    #[test]
    fn test_partition_keeps_relative_order() {
        let root = node(
            "r",
            ROOT_TITLE,
            None,
            Some(vec![
                node(
                    "f1",
                    "Work",
                    None,
                    Some(vec![
                        node("a", "A", Some("https://a.example"), None),
                        node("f2", "Docs", None, Some(vec![])),
                        node("b", "B", Some("https://b.example"), None),
                        node("f3", "Misc", None, None),
                    ]),
                ),
                node("loose", "Loose", Some("https://loose.example"), None),
                node("f4", "Personal", None, Some(vec![])),
            ]),
        );

        let groups = build_groups(&root);
        let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["f1", "f4", UNGROUPED_ID]);

        let work = &groups[0];
        assert_eq!(work.depth, 0);
        assert_eq!(work.items().map(|i| i.id.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(
            work.children().map(|g| g.id.as_str()).collect::<Vec<_>>(),
            ["f2", "f3"]
        );
        assert!(work.children().all(|g| g.depth == 1 && g.parent_id == "f1"));

        let ungrouped = &groups[2];
        assert_eq!(ungrouped.parent_id, "r");
        assert_eq!(ungrouped.items().next().map(|i| i.parent_id.as_str()), Some("r"));
    }

    #[test]
    fn test_empty_url_is_a_folder_and_no_ungrouped_when_empty() {
        let root = node(
            "r",
            ROOT_TITLE,
            None,
            Some(vec![node("f", "Blank url", Some(""), Some(vec![]))]),
        );
        let groups = build_groups(&root);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].id, "f");
    }

    #[tokio::test]
    async fn test_root_is_created_once() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();

        let first = get_or_create_root(&store).await.unwrap();
        assert_eq!(first.parent_id.as_deref(), Some(ROOT_PARENT_ID));
        assert_eq!(first.title, ROOT_TITLE);

        let second = get_or_create_root(&store).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_root_lookup_ignores_links_with_same_title() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();
        store
            .create(CreateDetails::link("1", ROOT_TITLE, "https://decoy.example"))
            .await
            .unwrap();

        let root = get_or_create_root(&store).await.unwrap();
        assert!(root.is_folder());
    }

    #[tokio::test]
    async fn test_load_groups_from_store() {
        let store = SqliteBookmarkStore::open_in_memory().unwrap();
        let root = get_or_create_root(&store).await.unwrap();
        let work = store
            .create(CreateDetails::folder(root.id.as_str(), "Work"))
            .await
            .unwrap();
        store
            .create(CreateDetails::link(work.id.as_str(), "Rust", "https://rust-lang.org"))
            .await
            .unwrap();

        let groups = load_groups(&store).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].title, "Work");
        assert_eq!(groups[0].item_count(), 1);
    }
}
