//! Entry operations on named stores.
//!
//! An entry is keyed by the hash of method + URL inside one store. Writes
//! replace the whole entry; concurrent writers to the same key are
//! last-write-wins.

use std::collections::BTreeMap;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::http::{Request, Response};
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response together with its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEntry {
    pub store: String,
    pub key: String,
    pub method: String,
    pub url: String,
    pub stored_at: String,
    pub response: Response,
}

impl CacheDb {
    /// Store a response for the request, creating the store if needed.
    pub async fn put_entry(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let store = store.to_string();
        let method = request.method.to_ascii_uppercase();
        let url = request.cache_url();
        let key = compute_cache_key(&method, &url);
        let headers_json = serde_json::to_string(&response.headers)?;
        let content_type = response.content_type().map(str::to_string);
        let response = response.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![&store, &now],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                    store, key, method, url, status, status_text,
                    headers_json, content_type, body, stored_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(store, key) DO UPDATE SET
                    method = excluded.method,
                    url = excluded.url,
                    status = excluded.status,
                    status_text = excluded.status_text,
                    headers_json = excluded.headers_json,
                    content_type = excluded.content_type,
                    body = excluded.body,
                    stored_at = excluded.stored_at",
                    params![
                        &store,
                        &key,
                        &method,
                        &url,
                        response.status as i64,
                        &response.status_text,
                        &headers_json,
                        &content_type,
                        &response.body,
                        &now,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the response stored for a request in one store.
    pub async fn match_entry(&self, store: &str, request: &Request) -> Result<Option<Response>, Error> {
        Ok(self.get_entry(store, request).await?.map(|entry| entry.response))
    }

    /// Look up a request in several stores, returning the first hit.
    pub async fn match_in(&self, stores: &[&str], request: &Request) -> Result<Option<Response>, Error> {
        for store in stores {
            if let Some(response) = self.match_entry(store, request).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    /// Get the full entry for a request in one store.
    pub async fn get_entry(&self, store: &str, request: &Request) -> Result<Option<CachedEntry>, Error> {
        let store = store.to_string();
        let key = compute_cache_key(&request.method, &request.cache_url());
        self.conn
            .call(move |conn| -> Result<Option<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT store, key, method, url, status, status_text, headers_json, body, stored_at
                FROM entries WHERE store = ?1 AND key = ?2",
                )?;

                let result = stmt.query_row(params![store, key], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, Vec<u8>>(7)?,
                        row.get::<_, String>(8)?,
                    ))
                });

                let (store, key, method, url, status, status_text, headers_json, body, stored_at) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let headers: BTreeMap<String, String> = serde_json::from_str(&headers_json)?;
                let status = u16::try_from(status)
                    .map_err(|_| Error::InvalidInput(format!("stored status out of range: {status}")))?;

                Ok(Some(CachedEntry {
                    store,
                    key,
                    method,
                    url,
                    stored_at,
                    response: Response { status, status_text, headers, body },
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// List the URLs cached in a store, oldest first.
    pub async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE store = ?1 ORDER BY stored_at ASC, url ASC")?;
                let urls = stmt
                    .query_map(params![store], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn count_entries(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store = ?1", params![store], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
