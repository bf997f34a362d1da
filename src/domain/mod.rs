//! Domain layer - core types, rules and ports.
//!
//! This layer contains the tree model, the drag/drop rules and the
//! interfaces to the bookmark store and sync directory, without any
//! concrete IO.

pub mod directory;
pub mod error;
pub mod gesture;
pub mod models;
pub mod reorder;
pub mod settings;
pub mod store;

pub use directory::{check_file_name, Permission, SyncDirectory};
pub use error::{AppError, ImportRejection, Result};
pub use gesture::{DragSource, DropTarget, GestureId, GestureState, GestureTracker, Release};
pub use models::{
    find_group_by_id, find_group_for_item, flatten_groups, BookmarkNode, Entry, ExportDocument,
    ExportGroup, ExportItem, Group, Item, NodeKind, APP_NAME, EXPORT_VERSION, ROOT_PARENT_ID,
    ROOT_TITLE, UNGROUPED_ID, UNGROUPED_TITLE,
};
pub use reorder::{translate_drop, DropIntent, Placement};
pub use settings::{AppConfig, PathConfig, Settings, SyncConfig};
pub use store::{BookmarkStore, CreateDetails, MoveDestination, NodeChanges, SearchQuery, StoreEvent};
