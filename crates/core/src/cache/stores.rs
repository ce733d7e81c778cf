//! Named store management.
//!
//! Stores are created on first use and deleted wholesale. Deleting a store
//! cascades to all of its entries.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// The two store names that belong to one worker version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoreNames {
    /// Holds the build-time asset manifest.
    pub precache: String,
    /// Holds resources fetched during normal operation.
    pub runtime: String,
}

impl StoreNames {
    /// Derive the store names for a prefix and version.
    ///
    /// Changing the version yields a disjoint pair of names, which is what
    /// lets activation treat every other store as stale.
    pub fn for_version(prefix: &str, version: &str) -> Self {
        Self { precache: format!("{prefix}-precache-{version}"), runtime: format!("{prefix}-runtime-{version}") }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.precache == name || self.runtime == name
    }

    /// Both names, precache first.
    pub fn all(&self) -> [&str; 2] {
        [self.precache.as_str(), self.runtime.as_str()]
    }
}

impl CacheDb {
    /// Create a store if it does not exist yet.
    ///
    /// Returns true if the store was created by this call.
    pub async fn open_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(inserted > 0)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List every store name in creation order.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns false if the store did not exist.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every store.
    ///
    /// Returns the names that were deleted.
    pub async fn clear_stores(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let tx = conn.transaction()?;
                let names = {
                    let mut stmt = tx.prepare("SELECT name FROM stores ORDER BY created_at ASC, name ASC")?;
                    let names = stmt
                        .query_map([], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<_>, _>>()?;
                    names
                };
                tx.execute("DELETE FROM stores", [])?;
                tx.commit()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }
}
