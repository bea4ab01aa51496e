//! SQLite directory files
//!
//! A directory file holds one or more naming contexts and the containers
//! created beneath them. The endpoint of a directory file is its path on
//! disk; `SqliteLocator` finds `<data_dir>/<domain>.db` for a domain hint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::domain::{dn_key, ContainerEntry, DirectoryClient, ServerLocator};
use crate::error::{DirectoryError, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS naming_contexts (
    dn_key TEXT PRIMARY KEY,
    dn     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS containers (
    dn_key     TEXT PRIMARY KEY,
    dn         TEXT NOT NULL,
    name       TEXT NOT NULL,
    parent_key TEXT NOT NULL,
    parent     TEXT NOT NULL,
    protected  INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_containers_parent ON containers(parent_key);
"#;

/// Directory backed by a SQLite file
pub struct SqliteDirectory {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteDirectory {
    /// Open an existing or new directory file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        debug!("Opened directory file {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create a directory file serving `root`
    pub fn create(path: impl AsRef<Path>, root: &str) -> Result<Self> {
        let dir = Self::open(path)?;
        dir.add_naming_context(root)?;
        Ok(dir)
    }

    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn add_naming_context(&self, root: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO naming_contexts (dn_key, dn) VALUES (?1, ?2)",
            params![dn_key(root), root],
        )?;
        info!("Registered naming context {}", root);
        Ok(())
    }

    pub fn naming_contexts(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT dn FROM naming_contexts ORDER BY dn_key")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Containers ordered by DN
    pub fn containers(&self) -> Result<Vec<ContainerEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT dn, name, parent, protected, created_at FROM containers ORDER BY dn_key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ContainerEntry {
                dn: row.get(0)?,
                name: row.get(1)?,
                parent: row.get(2)?,
                protected_from_deletion: row.get::<_, i64>(3)? != 0,
                created_at: row.get::<_, DateTime<Utc>>(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn entry_exists(conn: &Connection, key: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM naming_contexts WHERE dn_key = ?1
             UNION ALL
             SELECT 1 FROM containers WHERE dn_key = ?1
             LIMIT 1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

#[async_trait]
impl DirectoryClient for SqliteDirectory {
    async fn exists(&self, dn: &str) -> Result<bool> {
        let conn = self.conn.lock();
        Ok(entry_exists(&conn, &dn_key(dn))?)
    }

    async fn create_container(&self, name: &str, parent: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let entry = ContainerEntry::new(name, parent);
        let key = dn_key(&entry.dn);
        let parent_key = dn_key(parent);

        if !entry_exists(&tx, &parent_key)? {
            return Err(DirectoryError::no_such_parent(parent));
        }
        if entry_exists(&tx, &key)? {
            return Err(DirectoryError::already_exists(&entry.dn));
        }

        tx.execute(
            "INSERT INTO containers (dn_key, dn, name, parent_key, parent, protected, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                key,
                entry.dn,
                entry.name,
                parent_key,
                entry.parent,
                entry.protected_from_deletion as i64,
                entry.created_at,
            ],
        )?;
        tx.commit()?;

        debug!("Created container {}", entry.dn);
        Ok(())
    }
}

/// Finds directory files in a data directory
pub struct SqliteLocator {
    data_dir: PathBuf,
}

impl SqliteLocator {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path a directory file for `domain` is expected at
    pub fn path_for(&self, domain: &str) -> PathBuf {
        self.data_dir.join(format!("{}.db", domain.to_lowercase()))
    }
}

#[async_trait]
impl ServerLocator for SqliteLocator {
    async fn ping(&self, endpoint: &str) -> bool {
        tokio::fs::metadata(endpoint)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    async fn resolve_server(&self, domain_hint: &str) -> Result<String> {
        let candidate = self.path_for(domain_hint);
        if self.ping(&candidate.to_string_lossy()).await {
            Ok(candidate.to_string_lossy().into_owned())
        } else {
            Err(DirectoryError::unreachable(format!(
                "No directory file for domain '{}' (looked for {})",
                domain_hint,
                candidate.display()
            )))
        }
    }
}
