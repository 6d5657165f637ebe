use std::path::PathBuf;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::{PlagError, Result};

pub const DEFAULT_DB_NAME: &str = "new_database";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Databases live as `<db_name>.sqlite3` files under this directory.
    Directory(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub location: Location,
    pub db_name: String,
    /// Upper bound on waiting for the database during connect.
    pub connect_timeout: Duration,
}

impl ConnectionSettings {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::Directory(root.into()),
            db_name: DEFAULT_DB_NAME.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            db_name: DEFAULT_DB_NAME.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn url(&self) -> String {
        match &self.location {
            Location::Directory(root) => {
                format!("sqlite://{}/{}.sqlite3", root.display(), self.db_name)
            }
            Location::Memory => format!("sqlite://:memory:/{}", self.db_name),
        }
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let db = match &self.location {
            Location::Directory(root) => {
                Connection::open(root.join(format!("{}.sqlite3", self.db_name)))?
            }
            Location::Memory => Connection::open_in_memory()?,
        };
        db.busy_timeout(self.connect_timeout)?;
        // Liveness check: forces the file header to be read
        db.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })?;
        Ok(db)
    }
}

/// Owned handle to the document database.
///
/// Construction connects and verifies the database right away and fails
/// instead of returning a half-initialized handle. The handle is released by
/// [`DocumentConnection::disconnect`] or, failing that, on drop.
pub struct DocumentConnection {
    url: String,
    db_name: String,
    db: Option<Connection>,
}

impl DocumentConnection {
    pub fn connect(settings: &ConnectionSettings) -> Result<Self> {
        let url = settings.url();
        match settings.open() {
            Ok(db) => {
                debug!(%url, "Successfully connected to the document store");
                Ok(Self {
                    url,
                    db_name: settings.db_name.clone(),
                    db: Some(db),
                })
            }
            Err(source) => {
                error!(%url, error = %source, "Failed to connect to the document store");
                Err(PlagError::Connection { url, source })
            }
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn is_connected(&self) -> bool {
        self.db.is_some()
    }

    /// Handle to a collection, or `None` once the connection has been released.
    pub fn get_collection(&self, name: &'static str) -> Option<Collection<'_>> {
        self.db.as_ref().map(|db| Collection { name, db })
    }

    pub fn disconnect(&mut self) -> Result<()> {
        if let Some(db) = self.db.take() {
            db.close().map_err(|(_, err)| PlagError::Database(err))?;
            debug!(url = %self.url, "Document store connection closed");
        }
        Ok(())
    }
}

impl Drop for DocumentConnection {
    fn drop(&mut self) {
        if let Err(err) = self.disconnect() {
            warn!(url = %self.url, error = %err, "Failed to close document store connection");
        }
    }
}

/// A table of JSON documents keyed by their serialized `_id`.
pub struct Collection<'c> {
    name: &'static str,
    db: &'c Connection,
}

impl Collection<'_> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn ensure_exists(&self) -> Result<()> {
        self.db.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (id TEXT PRIMARY KEY NOT NULL, document TEXT NOT NULL)",
            self.name
        ))?;
        Ok(())
    }

    /// Inserts the document or replaces the one stored under the same id.
    pub fn update_one_upsert<I: Serialize, D: Serialize>(&self, id: &I, document: &D) -> Result<()> {
        let key = serde_json::to_string(id)?;
        let body = serde_json::to_string(document)?;
        self.db.execute(
            &format!(
                "INSERT INTO \"{}\" (id, document) VALUES (?1, ?2) \
                 ON CONFLICT(id) DO UPDATE SET document = excluded.document",
                self.name
            ),
            params![key, body],
        )?;
        Ok(())
    }

    pub fn find_one<I: Serialize>(&self, id: &I) -> Result<Option<serde_json::Value>> {
        let key = serde_json::to_string(id)?;
        let body: Option<String> = self
            .db
            .query_row(
                &format!("SELECT document FROM \"{}\" WHERE id = ?1", self.name),
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| serde_json::from_str(&b)).transpose().map_err(PlagError::from)
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 = self.db.query_row(
            &format!("SELECT count(*) FROM \"{}\"", self.name),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_rendering() {
        let settings = ConnectionSettings::new("/var/lib/plag").db_name("works");
        assert_eq!(settings.url(), "sqlite:///var/lib/plag/works.sqlite3");
        assert_eq!(
            ConnectionSettings::in_memory().url(),
            "sqlite://:memory:/new_database"
        );
    }

    #[test]
    fn test_connect_in_memory() {
        let conn = DocumentConnection::connect(&ConnectionSettings::in_memory()).unwrap();
        assert!(conn.is_connected());
        assert_eq!(conn.db_name(), DEFAULT_DB_NAME);
        assert!(conn.get_collection("features").is_some());
    }

    #[test]
    fn test_connect_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ConnectionSettings::new(dir.path()).db_name("plag");
        let conn = DocumentConnection::connect(&settings).unwrap();
        drop(conn);
        assert!(dir.path().join("plag.sqlite3").is_file());
    }

    #[test]
    fn test_connect_fails_fast_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ConnectionSettings::new(dir.path().join("no").join("such"));
        let err = DocumentConnection::connect(&settings).err().unwrap();
        assert!(matches!(err, PlagError::Connection { .. }));
    }

    #[test]
    fn test_connect_fails_on_corrupt_database() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("broken.sqlite3"),
            "this is not a database file ".repeat(64),
        )
        .unwrap();
        let settings = ConnectionSettings::new(dir.path())
            .db_name("broken")
            .connect_timeout(Duration::from_millis(100));
        let err = DocumentConnection::connect(&settings).err().unwrap();
        assert!(err.to_string().contains("broken.sqlite3"));
    }

    #[test]
    fn test_disconnect_releases_collections() {
        let mut conn = DocumentConnection::connect(&ConnectionSettings::in_memory()).unwrap();
        conn.disconnect().unwrap();
        assert!(!conn.is_connected());
        assert!(conn.get_collection("features").is_none());
        // A second release is a no-op
        conn.disconnect().unwrap();
    }

    #[test]
    fn test_collection_upsert_overwrites() {
        let conn = DocumentConnection::connect(&ConnectionSettings::in_memory()).unwrap();
        let collection = conn.get_collection("docs").unwrap();
        collection.ensure_exists().unwrap();

        collection.update_one_upsert(&"k", &json!({"_id": "k", "v": 1, "extra": true})).unwrap();
        collection.update_one_upsert(&"k", &json!({"_id": "k", "v": 2})).unwrap();

        assert_eq!(collection.count().unwrap(), 1);
        assert_eq!(
            collection.find_one(&"k").unwrap(),
            Some(json!({"_id": "k", "v": 2}))
        );
        assert_eq!(collection.find_one(&"missing").unwrap(), None);
    }
}
