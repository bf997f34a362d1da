//! Sync directory on the local filesystem.
//!
//! Permission maps onto the directory itself: an existing writable directory
//! is granted, a missing one can be created on request.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{check_file_name, AppError, Permission, Result, SyncDirectory};

/// A local directory used as the sync target.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
}

impl LocalDirectory {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        Self { path, name }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_path(&self, file_name: &str) -> Result<PathBuf> {
        check_file_name(file_name)?;
        Ok(self.path.join(file_name))
    }
}

#[async_trait]
impl SyncDirectory for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query_permission(&self) -> Permission {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_dir() && !meta.permissions().readonly() => Permission::Granted,
            Err(e) if e.kind() == ErrorKind::NotFound => Permission::Prompt,
            Ok(_) | Err(_) => Permission::Denied,
        }
    }

    async fn request_permission(&self) -> Permission {
        if self.query_permission().await == Permission::Prompt {
            if let Err(e) = tokio::fs::create_dir_all(&self.path).await {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to create sync directory"
                );
                return Permission::Denied;
            }
        }
        self.query_permission().await
    }

    async fn write_file(&self, file_name: &str, contents: &[u8]) -> Result<()> {
        let path = self.file_path(file_name)?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))
    }

    async fn remove_file(&self, file_name: &str) -> Result<()> {
        let path = self.file_path(file_name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| AppError::io(format!("Failed to remove {}", path.display()), e))
    }

    async fn list_files(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| AppError::io(format!("Failed to list {}", self.path.display()), e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::io("Failed to read directory entry", e))?
        {
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if is_file {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_list_remove() {
        let dir = tempdir().unwrap();
        let local = LocalDirectory::new(dir.path());

        assert_eq!(local.query_permission().await, Permission::Granted);

        local.write_file("b.json", b"{}").await.unwrap();
        local.write_file("a.json", b"[]").await.unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        assert_eq!(local.list_files().await.unwrap(), ["a.json", "b.json"]);

        local.remove_file("a.json").await.unwrap();
        assert_eq!(local.list_files().await.unwrap(), ["b.json"]);
        assert!(local.remove_file("a.json").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_directory_is_created_on_request() {
        let dir = tempdir().unwrap();
        let local = LocalDirectory::new(dir.path().join("Drive").join("SyncGrid"));

        assert_eq!(local.name(), "SyncGrid");
        assert_eq!(local.query_permission().await, Permission::Prompt);
        assert_eq!(local.request_permission().await, Permission::Granted);
        assert!(local.path().is_dir());
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = tempdir().unwrap();
        let local = LocalDirectory::new(dir.path().join("inner"));
        local.request_permission().await;

        assert!(local.write_file("../escape.json", b"x").await.is_err());
        assert!(local.write_file("..", b"x").await.is_err());
        assert!(!dir.path().join("escape.json").exists());
    }

    #[tokio::test]
    async fn test_file_path_is_denied() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        assert_eq!(
            LocalDirectory::new(&file).query_permission().await,
            Permission::Denied
        );
    }
}
