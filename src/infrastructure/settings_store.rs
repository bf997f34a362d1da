//! Persisted settings record.
//!
//! The whole `Settings` record is kept as one JSON value in a small
//! key-value table, next to the bookmark tables in the same database file.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{AppError, Result, Settings};

/// Key the settings record is stored under.
pub const SETTINGS_KEY: &str = "syncgrid_settings";

/// Key-value settings storage in SQLite.
pub struct SettingsStore {
    conn: Mutex<Connection>,
}

impl SettingsStore {
    /// Opens or creates the settings table.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or schema creation fails.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create storage directory", e))?;
        }

        let conn = Connection::open(path).map_err(AppError::store)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(AppError::store)?;
        Self::with_connection(conn)
    }

    /// # Errors
    /// Returns error if schema creation fails.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(AppError::store)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )
        .map_err(AppError::store)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| AppError::Store {
            message: "settings connection lock poisoned".into(),
            source: None,
        })
    }

    /// Load settings; missing fields (or a missing record) fall back to
    /// defaults.
    ///
    /// # Errors
    /// Returns error if the record cannot be read or is not valid JSON.
    pub fn load(&self) -> Result<Settings> {
        let value: Option<String> = self
            .lock()?
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                [SETTINGS_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(AppError::store)?;

        value.map_or_else(
            || Ok(Settings::default()),
            |json| serde_json::from_str(&json).map_err(AppError::json_parse),
        )
    }

    /// Replace the stored settings.
    ///
    /// # Errors
    /// Returns error if the record cannot be written.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let json = serde_json::to_string(settings).map_err(AppError::json_parse)?;

        self.lock()?
            .execute(
                r"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
                params![SETTINGS_KEY, json, Utc::now().to_rfc3339()],
            )
            .map_err(AppError::store)?;

        tracing::debug!("Settings saved");
        Ok(())
    }

    /// Read-modify-write the settings record.
    ///
    /// # Errors
    /// Returns error if loading or saving fails.
    pub fn update(&self, f: impl FnOnce(Settings) -> Settings) -> Result<Settings> {
        let updated = f(self.load()?);
        self.save(&updated)?;
        Ok(updated)
    }
}
