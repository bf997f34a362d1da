//! Port to a user-granted sync directory.
//!
//! Access is by plain file name inside the granted directory only.

use async_trait::async_trait;

use super::error::{AppError, Result};

/// Permission state of a directory capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// Not decided yet; asking may grant it.
    Prompt,
}

/// A directory the user granted read-write access to.
#[async_trait]
pub trait SyncDirectory: Send + Sync {
    /// Display name of the directory.
    fn name(&self) -> &str;

    async fn query_permission(&self) -> Permission;

    async fn request_permission(&self) -> Permission;

    /// Create or overwrite `file_name` with `contents` in a single write.
    async fn write_file(&self, file_name: &str, contents: &[u8]) -> Result<()>;

    async fn remove_file(&self, file_name: &str) -> Result<()>;

    async fn list_files(&self) -> Result<Vec<String>>;
}

/// Reject anything that is not a single plain file name.
///
/// # Errors
/// Returns `InvalidOperation` for empty names, `.`/`..`, or names containing
/// a path separator or NUL.
pub fn check_file_name(file_name: &str) -> Result<()> {
    let bad = file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains(['/', '\\', '\0']);

    if bad {
        return Err(AppError::invalid_operation(format!(
            "'{file_name}' is not a plain file name"
        )));
    }
    Ok(())
}
