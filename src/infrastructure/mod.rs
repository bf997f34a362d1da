//! Infrastructure layer - external adapters (database, filesystem).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod local_directory;
pub mod settings_store;
pub mod sqlite_store;

pub use config::{config_file_path, ensure_config_exists, load_config};
pub use local_directory::LocalDirectory;
pub use settings_store::SettingsStore;
pub use sqlite_store::SqliteBookmarkStore;
