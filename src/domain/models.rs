//! Domain models for the bookmark grid.
//!
//! `BookmarkNode` is the raw shape handed out by the bookmark store. `Group`
//! and `Item` are the read-only projection the rest of the crate works with,
//! and the `Export*` types are the portable document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title of the folder that holds everything this tool manages.
pub const ROOT_TITLE: &str = "__SyncGrid__";

/// Store folder the root is created under when missing ("Other Bookmarks").
pub const ROOT_PARENT_ID: &str = "2";

/// Id of the synthetic folder collecting links placed directly in the root.
pub const UNGROUPED_ID: &str = "__ungrouped__";

/// Display title of the synthetic ungrouped folder.
pub const UNGROUPED_TITLE: &str = "Ungrouped";

/// Application name stamped into export documents.
pub const APP_NAME: &str = "SyncGrid";

/// Export document format version.
pub const EXPORT_VERSION: u32 = 1;

/// Whether a node is a link or a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Link,
    Folder,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Link => write!(f, "link"),
            Self::Folder => write!(f, "folder"),
        }
    }
}

/// A node as stored by the bookmark store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    /// Opaque store id.
    pub id: String,
    /// Parent folder id, absent only for the store's own root.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Position among the parent's children.
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub title: String,
    /// Present (and non-empty) for links only.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
    /// Direct children in store order; only filled in by subtree reads.
    #[serde(default)]
    pub children: Option<Vec<BookmarkNode>>,
}

impl BookmarkNode {
    /// A node is a link when it carries a non-empty URL.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => NodeKind::Link,
            _ => NodeKind::Folder,
        }
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.kind() == NodeKind::Folder
    }

    /// Children of a subtree read, or an empty slice.
    #[must_use]
    pub fn child_nodes(&self) -> &[Self] {
        self.children.as_deref().unwrap_or_default()
    }
}

/// A bookmark inside a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub url: String,
    pub date_added: Option<DateTime<Utc>>,
    pub parent_id: String,
}

/// One direct child of a group, in store order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Link(Item),
    Folder(Group),
}

impl Entry {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Link(item) => &item.id,
            Self::Folder(group) => &group.id,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Link(_) => NodeKind::Link,
            Self::Folder(_) => NodeKind::Folder,
        }
    }
}

/// A folder and its contents, as a read-only snapshot.
///
/// The children are kept as one mixed list in store order; `items()` and
/// `children()` are filtered views over it, so they can never disagree with
/// the store's interleaving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub title: String,
    pub parent_id: String,
    pub depth: usize,
    entries: Vec<Entry>,
}

impl Group {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        parent_id: impl Into<String>,
        depth: usize,
        entries: Vec<Entry>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parent_id: parent_id.into(),
            depth,
            entries,
        }
    }

    /// All direct children in store order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Links, in store order.
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Link(item) => Some(item),
            Entry::Folder(_) => None,
        })
    }

    /// Sub-folders, in store order.
    pub fn children(&self) -> impl Iterator<Item = &Self> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Folder(group) => Some(group),
            Entry::Link(_) => None,
        })
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items().count()
    }

    /// Links in this group and every nested group.
    #[must_use]
    pub fn total_item_count(&self) -> usize {
        self.item_count() + self.children().map(Self::total_item_count).sum::<usize>()
    }

    #[must_use]
    pub fn is_ungrouped(&self) -> bool {
        self.id == UNGROUPED_ID
    }
}

/// Finds a group anywhere in the tree, depth-first.
#[must_use]
pub fn find_group_by_id<'a>(groups: &'a [Group], id: &str) -> Option<&'a Group> {
    fn walk<'a>(group: &'a Group, id: &str) -> Option<&'a Group> {
        if group.id == id {
            return Some(group);
        }
        group.children().find_map(|child| walk(child, id))
    }

    groups.iter().find_map(|group| walk(group, id))
}

/// Id of the group that directly contains the given item.
#[must_use]
pub fn find_group_for_item<'a>(groups: &'a [Group], item_id: &str) -> Option<&'a str> {
    fn walk<'a>(group: &'a Group, item_id: &str) -> Option<&'a str> {
        if group.items().any(|item| item.id == item_id) {
            return Some(group.id.as_str());
        }
        group.children().find_map(|child| walk(child, item_id))
    }

    groups.iter().find_map(|group| walk(group, item_id))
}

/// All groups in pre-order (parent before its children).
#[must_use]
pub fn flatten_groups(groups: &[Group]) -> Vec<&Group> {
    fn push<'a>(group: &'a Group, out: &mut Vec<&'a Group>) {
        out.push(group);
        for child in group.children() {
            push(child, out);
        }
    }

    let mut out = Vec::new();
    for group in groups {
        push(group, &mut out);
    }
    out
}

/// A link inside an export document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportItem {
    pub title: String,
    pub url: String,
}

/// A folder inside an export document. Field order is part of the checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportGroup {
    pub title: String,
    pub items: Vec<ExportItem>,
    pub children: Vec<ExportGroup>,
}

impl From<&Group> for ExportGroup {
    fn from(group: &Group) -> Self {
        Self {
            title: group.title.clone(),
            items: group
                .items()
                .map(|item| ExportItem {
                    title: item.title.clone(),
                    url: item.url.clone(),
                })
                .collect(),
            children: group.children().map(Self::from).collect(),
        }
    }
}

/// The portable backup document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    pub exported_at: String,
    pub app_name: String,
    pub checksum: String,
    pub data: Vec<ExportGroup>,
}

impl ExportDocument {
    /// Number of folders at every level.
    #[must_use]
    pub fn group_count(&self) -> usize {
        fn count(groups: &[ExportGroup]) -> usize {
            groups.iter().map(|g| 1 + count(&g.children)).sum()
        }
        count(&self.data)
    }

    /// Number of links at every level.
    #[must_use]
    pub fn item_count(&self) -> usize {
        fn count(groups: &[ExportGroup]) -> usize {
            groups
                .iter()
                .map(|g| g.items.len() + count(&g.children))
                .sum()
        }
        count(&self.data)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{Entry, Group, Item};

    pub fn item(id: &str, title: &str, url: &str, parent: &str) -> Entry {
        Entry::Link(Item {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            date_added: None,
            parent_id: parent.into(),
        })
    }

    /// Work(GitHub, Jira, Docs(Wiki, Archive)), Personal(Blog)
    pub fn nested() -> Vec<Group> {
        vec![
            Group::new(
                "g1",
                "Work",
                "root",
                0,
                vec![
                    item("i1", "GitHub", "https://github.com", "g1"),
                    Entry::Folder(Group::new(
                        "g2",
                        "Docs",
                        "g1",
                        1,
                        vec![
                            item("i3", "Wiki", "https://wiki.com", "g2"),
                            Entry::Folder(Group::new("g3", "Archive", "g2", 2, vec![])),
                        ],
                    )),
                    item("i2", "Jira", "https://jira.com", "g1"),
                ],
            ),
            Group::new(
                "g4",
                "Personal",
                "root",
                0,
                vec![item("i4", "Blog", "https://blog.com", "g4")],
            ),
        ]
    }
}
