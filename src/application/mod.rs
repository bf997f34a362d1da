//! Application layer - use cases and orchestration.
//!
//! This layer loads the bookmark tree, edits and reorders it, and moves it
//! in and out of export documents and the sync folder.

pub mod auto_sync;
pub mod bookmarks;
pub mod export_codec;
pub mod folder_mirror;
pub mod formatter;
pub mod import_validator;
pub mod reorder_engine;
pub mod restore_service;
pub mod tree_loader;
pub mod tree_watcher;

pub use auto_sync::{AutoSync, OutcomeHook};
pub use bookmarks::BookmarkService;
pub use export_codec::{backup_filename, compute_checksum, export_data, export_data_at, to_pretty_json};
pub use folder_mirror::{FolderMirror, SyncOutcome, SYNC_FILENAME};
pub use formatter::{
    format_document_summary, format_group_list, format_json, format_restore, format_search,
    format_sync_outcome, format_sync_status, format_table, format_tree, OutputFormat,
};
pub use import_validator::{read_import_file, validate_import, SanitizedDocument};
pub use reorder_engine::{DropOutcome, ReorderEngine};
pub use restore_service::{RestoreResult, RestoreService};
pub use tree_loader::{get_or_create_root, load_groups};
pub use tree_watcher::{Snapshot, TreeWatcher};
