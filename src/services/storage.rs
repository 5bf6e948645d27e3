use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task;

/// Durable key-value slot store. Each slot holds one JSON blob and is
/// rewritten wholesale on every committed mutation; last writer wins.
#[derive(Debug, Clone)]
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    pub async fn open() -> Result<Self> {
        let path = Self::db_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let storage = Storage {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.init_schema()?;

        Ok(storage)
    }

    /// In-memory storage (used for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn db_path() -> Result<PathBuf> {
        let data_dir = match std::env::var("XDG_DATA_HOME") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => {
                let home = std::env::var("HOME").context("HOME not set")?;
                PathBuf::from(home).join(".local/share")
            }
        };
        Ok(data_dir.join("muse").join("muse.db"))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub async fn get_slot(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.clone();
        let key = key.to_string();
        task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            let result: Option<String> = conn
                .query_row(
                    "SELECT value FROM slots WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(result)
        })
        .await?
    }

    pub async fn put_slot(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.clone();
        let key = key.to_string();
        let value = value.to_string();
        task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            conn.execute(
                "INSERT INTO slots (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
            Ok(())
        })
        .await?
    }

    /// Read and deserialize a slot. A missing slot yields `None`; so does a
    /// malformed one, with a warning, so corrupted storage degrades to
    /// defaults instead of aborting hydration.
    pub async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get_slot(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Discarding malformed slot '{}': {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read slot '{}': {}", key, e);
                None
            }
        }
    }

    pub async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.put_slot(key, &json).await
    }
}
