//! Console output for the bookmark tree and command results.
//!
//! Supports three listing formats: an indented tree, a flat table, and JSON.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::domain::{flatten_groups, Entry, ExportDocument, Group, Item, Settings};

use super::bookmarks::SearchHit;
use super::folder_mirror::SyncOutcome;
use super::restore_service::RestoreResult;

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented tree in store order.
    #[default]
    Tree,
    /// One row per node.
    Table,
    /// JSON format for programmatic use.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tree" => Ok(Self::Tree),
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Use: tree, table, json")),
        }
    }
}

/// Formats groups as an indented tree, links and folders interleaved as in
/// the store.
#[must_use]
pub fn format_tree(groups: &[Group]) -> String {
    if groups.is_empty() {
        return "No groups yet.".dimmed().to_string();
    }

    let mut out = String::new();
    for group in groups {
        push_group(&mut out, group, 0);
    }
    out
}

fn push_group(out: &mut String, group: &Group, indent: usize) {
    let pad = "  ".repeat(indent);
    out.push_str(&format!(
        "{pad}📁 {} {}\n",
        group.title.bold().blue(),
        format!("[{}]", group.id).dimmed()
    ));

    for entry in group.entries() {
        match entry {
            Entry::Link(item) => out.push_str(&format!(
                "{pad}  🔗 {} {} {}\n",
                item.title,
                truncate(&item.url, 60).dimmed(),
                format!("[{}]", item.id).dimmed()
            )),
            Entry::Folder(child) => push_group(out, child, indent + 1),
        }
    }
}

/// Formats every node as a table row.
#[must_use]
pub fn format_table(groups: &[Group]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Kind", "Group", "Title", "URL", "Added"]);

    fn add_rows(table: &mut Table, group: &Group) {
        for entry in group.entries() {
            match entry {
                Entry::Link(item) => {
                    let added = item.date_added.map_or_else(
                        || "-".to_string(),
                        |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
                    );
                    table.add_row(vec![
                        item.id.as_str(),
                        "link",
                        group.title.as_str(),
                        truncate(&item.title, 35).as_str(),
                        truncate(&item.url, 45).as_str(),
                        added.as_str(),
                    ]);
                }
                Entry::Folder(child) => {
                    table.add_row(vec![
                        child.id.as_str(),
                        "folder",
                        group.title.as_str(),
                        truncate(&child.title, 35).as_str(),
                        "-",
                        "-",
                    ]);
                    add_rows(table, child);
                }
            }
        }
    }

    for group in groups {
        table.add_row(vec![
            group.id.as_str(),
            "folder",
            "-",
            truncate(&group.title, 35).as_str(),
            "-",
            "-",
        ]);
        add_rows(&mut table, group);
    }

    table.to_string()
}

/// One line per group in pre-order, with item counts.
#[must_use]
pub fn format_group_list(groups: &[Group]) -> String {
    let flat = flatten_groups(groups);
    if flat.is_empty() {
        return "No groups yet.".dimmed().to_string();
    }

    flat.iter()
        .map(|group| {
            format!(
                "{}{} {} {}",
                "  ".repeat(group.depth),
                group.title.bold(),
                format!("[{}]", group.id).dimmed(),
                format!("({}/{})", group.item_count(), group.total_item_count()).cyan()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Search matches as a table.
#[must_use]
pub fn format_search(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No matches.".dimmed().to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Kind", "Group", "Title", "URL"]);

    for hit in hits {
        let kind = hit.node.kind().to_string();
        let url = hit.node.url.as_deref().unwrap_or("-");
        table.add_row(vec![
            hit.node.id.as_str(),
            kind.as_str(),
            hit.group_id.as_str(),
            truncate(&hit.node.title, 35).as_str(),
            truncate(url, 45).as_str(),
        ]);
    }

    table.to_string()
}

/// JSON view of a group: the presentation model with split lists.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupView<'a> {
    id: &'a str,
    title: &'a str,
    parent_id: &'a str,
    depth: usize,
    items: Vec<&'a Item>,
    children: Vec<GroupView<'a>>,
}

impl<'a> From<&'a Group> for GroupView<'a> {
    fn from(group: &'a Group) -> Self {
        Self {
            id: &group.id,
            title: &group.title,
            parent_id: &group.parent_id,
            depth: group.depth,
            items: group.items().collect(),
            children: group.children().map(GroupView::from).collect(),
        }
    }
}

/// Formats groups as JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_json(groups: &[Group]) -> Result<String, serde_json::Error> {
    let views: Vec<GroupView<'_>> = groups.iter().map(GroupView::from).collect();
    serde_json::to_string_pretty(&views)
}

/// Summary of an export document.
#[must_use]
pub fn format_document_summary(doc: &ExportDocument) -> String {
    format!(
        "{}\n  Exported at: {}\n  Groups: {}\n  Bookmarks: {}\n  Checksum: {}",
        "📦 Document".bold(),
        doc.exported_at.cyan(),
        doc.group_count().to_string().cyan(),
        doc.item_count().to_string().green(),
        truncate(&doc.checksum, 19).dimmed()
    )
}

/// Summary of a restore.
#[must_use]
pub fn format_restore(result: &RestoreResult) -> String {
    format!(
        "{}\n  Removed: {}\n  Groups created: {}\n  Bookmarks created: {}",
        "♻️  Restore".bold(),
        result.removed_nodes.to_string().yellow(),
        result.created_groups.to_string().cyan(),
        result.created_items.to_string().green()
    )
}

/// One line describing a sync attempt.
#[must_use]
pub fn format_sync_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Synced { synced_at } => format!(
            "{} at {}",
            "✓ Synced".green(),
            synced_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        SyncOutcome::Coalesced => "Sync already in progress".yellow().to_string(),
        SyncOutcome::NoPermission => "✗ No write permission for the sync folder".red().to_string(),
        SyncOutcome::Failed { reason } => format!("{} {reason}", "✗ Sync failed:".red()),
    }
}

/// Folder sync status from the settings record and the files currently in
/// the sync folder.
#[must_use]
pub fn format_sync_status(settings: &Settings, files: &[String]) -> String {
    let folder = settings.sync_directory.as_ref().map_or_else(
        || "not connected".dimmed().to_string(),
        |p| p.display().to_string().cyan().to_string(),
    );
    let last = settings.last_synced_at.map_or_else(
        || "never".dimmed().to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );

    let mut out = format!(
        "{}\n  Folder: {folder}\n  Last synced: {last}",
        "🔄 Folder sync".bold()
    );
    for file in files {
        out.push_str(&format!("\n    {}", file.dimmed()));
    }
    out
}

/// Truncates a string to max characters with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
