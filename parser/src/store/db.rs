//! Thin owner of the sqlite connection (§5 "Shared-resource policy":
//! trackers accept the connection as an `Execute` argument; they hold no
//! long-lived reference to it).

use std::path::Path;

use rusqlite::Connection;

use crate::error::StoreError;

use super::schema::schema_sql;

/// Opens (and, if needed, migrates) the sqlite-backed store.
pub struct Store {
    pub conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(&schema_sql())?;
        Ok(Self { conn })
    }
}
