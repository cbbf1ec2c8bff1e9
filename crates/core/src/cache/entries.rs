//! Entry CRUD operations.
//!
//! Entries are captured responses keyed by request identity inside a
//! store. Writes are unconditional upserts: the last writer wins.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A full captured response: status, headers and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoredResponse {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub cached_at: Option<String>,
}

impl StoredResponse {
    /// Build a response that never touched the network, e.g. an offline page.
    pub fn synthetic(method: &str, url: &str, status: u16, body: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            status,
            headers: vec![("content-type".to_string(), "text/plain; charset=utf-8".to_string())],
            body: body.as_bytes().to_vec(),
            cached_at: None,
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value with the given (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn key(&self) -> String {
        compute_request_key(&self.method, &self.url)
    }
}

fn decode_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, u16, String, Vec<u8>, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn into_response(
    (method, url, status, headers_json, body, cached_at): (String, String, u16, String, Vec<u8>, String),
) -> Result<StoredResponse, Error> {
    let headers = serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
    Ok(StoredResponse { method, url, status, headers, body, cached_at: Some(cached_at) })
}

impl CacheDb {
    /// Insert or overwrite an entry in `store`, creating the store if needed.
    ///
    /// Callers decide whether a response is worth caching; this layer
    /// stores whatever it is given.
    pub async fn put_entry(&self, store: &str, response: &StoredResponse) -> Result<(), Error> {
        let store = store.to_string();
        let key = response.key();
        let method = response.method.to_ascii_uppercase();
        let url = response.url.clone();
        let status = response.status;
        let body = response.body.clone();
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![&store, &now],
                )?;
                tx.execute(
                    "INSERT INTO entries (store, key, method, url, status, headers_json, body, cached_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(store, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        cached_at = excluded.cached_at",
                    params![&store, &key, &method, &url, status, &headers_json, &body, &now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry in one store.
    pub async fn match_entry(&self, store: &str, method: &str, url: &str) -> Result<Option<StoredResponse>, Error> {
        let store = store.to_string();
        let key = compute_request_key(method, url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<_>, Error> {
                let result = conn.query_row(
                    "SELECT method, url, status, headers_json, body, cached_at
                     FROM entries WHERE store = ?1 AND key = ?2",
                    params![store, key],
                    decode_row,
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(into_response).transpose()
    }

    /// Look up an entry across all stores, oldest store first.
    pub async fn match_any(&self, method: &str, url: &str) -> Result<Option<StoredResponse>, Error> {
        let key = compute_request_key(method, url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<_>, Error> {
                let result = conn.query_row(
                    "SELECT e.method, e.url, e.status, e.headers_json, e.body, e.cached_at
                     FROM entries e JOIN stores s ON s.name = e.store
                     WHERE e.key = ?1
                     ORDER BY s.created_at ASC, s.name ASC
                     LIMIT 1",
                    params![key],
                    decode_row,
                );
                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(into_response).transpose()
    }

    /// List `(method, url)` pairs of every entry in a store.
    pub async fn entry_keys(&self, store: &str) -> Result<Vec<(String, String)>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE store = ?1 ORDER BY url ASC")?;
                let keys = stmt
                    .query_map(params![store], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry. Returns true if it existed.
    pub async fn delete_entry(&self, store: &str, method: &str, url: &str) -> Result<bool, Error> {
        let store = store.to_string();
        let key = compute_request_key(method, url);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM entries WHERE store = ?1 AND key = ?2", params![store, key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(url: &str, body: &str) -> StoredResponse {
        StoredResponse {
            method: "GET".to_string(),
            url: url.to_string(),
            status: 200,
            headers: vec![("content-type".to_string(), "text/css".to_string())],
            body: body.as_bytes().to_vec(),
            cached_at: None,
        }
    }

    #[test]
    fn test_is_ok_range() {
        let mut response = make_response("https://example.com/", "");
        assert!(response.is_ok());
        response.status = 299;
        assert!(response.is_ok());
        response.status = 304;
        assert!(!response.is_ok());
        response.status = 500;
        assert!(!response.is_ok());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let response = make_response("https://example.com/", "");
        assert_eq!(response.header("Content-Type"), Some("text/css"));
        assert_eq!(response.content_type(), Some("text/css"));
        assert_eq!(response.header("etag"), None);
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let response = make_response("https://example.com/css/main.css", "body{}");

        db.put_entry("axioma-capital-v1.0.0", &response).await.unwrap();

        let found = db
            .match_entry("axioma-capital-v1.0.0", "GET", "https://example.com/css/main.css")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.body, b"body{}");
        assert_eq!(found.content_type(), Some("text/css"));
        assert!(found.cached_at.is_some());
        assert!(db.has_store("axioma-capital-v1.0.0").await.unwrap());
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("axioma-capital-v1.0.0").await.unwrap();
        let result = db
            .match_entry("axioma-capital-v1.0.0", "GET", "https://example.com/missing")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://example.com/js/main.js";
        db.put_entry("s-v1", &make_response(url, "old")).await.unwrap();
        db.put_entry("s-v1", &make_response(url, "new")).await.unwrap();

        let found = db.match_entry("s-v1", "GET", url).await.unwrap().unwrap();
        assert_eq!(found.body, b"new");
        assert_eq!(db.entry_keys("s-v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_match_is_method_scoped() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://example.com/api/contact";
        db.put_entry("s-v1", &make_response(url, "{}")).await.unwrap();

        assert!(db.match_entry("s-v1", "POST", url).await.unwrap().is_none());
        assert!(db.match_entry("s-v1", "get", url).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_match_any_searches_all_stores() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://example.com/offline.html";
        db.put_entry("axioma-capital-v1.0.0", &make_response(url, "offline"))
            .await
            .unwrap();
        db.open_store("axioma-capital-v1.0.1").await.unwrap();

        let found = db.match_any("GET", url).await.unwrap().unwrap();
        assert_eq!(found.body, b"offline");
    }

    #[tokio::test]
    async fn test_delete_store_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://example.com/css/main.css";
        db.put_entry("s-v1", &make_response(url, "body{}")).await.unwrap();

        db.delete_store("s-v1").await.unwrap();
        assert!(db.match_any("GET", url).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stores_size_sums_bodies() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("axioma-capital-v1.0.0", &make_response("https://example.com/a", "12345"))
            .await
            .unwrap();
        db.put_entry("axioma-capital-v1.0.1", &make_response("https://example.com/b", "123"))
            .await
            .unwrap();
        db.put_entry("unrelated-v1", &make_response("https://example.com/c", "1234567"))
            .await
            .unwrap();

        assert_eq!(db.stores_size("axioma-capital").await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let url = "https://example.com/a";
        db.put_entry("s-v1", &make_response(url, "x")).await.unwrap();

        assert!(db.delete_entry("s-v1", "GET", url).await.unwrap());
        assert!(!db.delete_entry("s-v1", "GET", url).await.unwrap());
    }
}
