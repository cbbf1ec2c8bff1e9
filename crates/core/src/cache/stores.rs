//! Store-level operations.
//!
//! A store is a named container of entries. Names follow the
//! `<prefix>-<version>` convention, so everything owned by one
//! deployment can be found by prefix.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;

/// Returns true when `name` belongs to the `prefix` family (`<prefix>-...`).
pub fn has_prefix(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('-'))
}

impl CacheDb {
    /// Create a store if it doesn't exist yet.
    ///
    /// Returns true if the store was newly created.
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

    /// Check whether a store exists.
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
    /// Returns true if the store existed.
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

    /// Delete every store named `<prefix>-...`.
    ///
    /// Returns the number of deleted stores.
    pub async fn delete_stores_with_prefix(&self, prefix: &str) -> Result<u64, Error> {
        let family = format!("{prefix}-");
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let deleted = conn.execute(
                    "DELETE FROM stores WHERE substr(name, 1, length(?1)) = ?1",
                    params![family],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Sum of body byte lengths across every store named `<prefix>-...`.
    pub async fn stores_size(&self, prefix: &str) -> Result<u64, Error> {
        let family = format!("{prefix}-");
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let total: i64 = conn.query_row(
                    "SELECT COALESCE(SUM(length(e.body)), 0)
                     FROM entries e JOIN stores s ON s.name = e.store
                     WHERE substr(s.name, 1, length(?1)) = ?1",
                    params![family],
                    |row| row.get(0),
                )?;
                Ok(total.max(0) as u64)
            })
            .await
            .map_err(Error::from)
    }
}
