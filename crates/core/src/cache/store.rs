//! Named stores and their entries.
//!
//! A store is created lazily on first open and removed only as a whole.
//! Entries have no TTL; re-putting a key replaces the previous response.

use super::connection::CacheDb;
use super::key::RequestKey;
use super::response::CapturedResponse;
use crate::Error;
use tokio_rusqlite::{params, rusqlite};

/// Handle to one named store.
#[derive(Clone, Debug)]
pub struct Store {
    db: CacheDb,
    name: String,
}

/// Row values for one entry, encoded outside the database thread.
struct EncodedEntry {
    key_hash: String,
    method: String,
    url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
}

impl EncodedEntry {
    fn encode(key: &RequestKey, response: &CapturedResponse) -> Result<Self, Error> {
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::CorruptEntry(format!("failed to encode headers: {e}")))?;
        Ok(Self {
            key_hash: key.digest(),
            method: key.method().to_string(),
            url: key.url().to_string(),
            status: i64::from(response.status),
            headers_json,
            body: response.body.clone(),
        })
    }
}

fn ensure_store(conn: &rusqlite::Connection, name: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn insert_entry(conn: &rusqlite::Connection, store: &str, entry: &EncodedEntry, now: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT INTO entries (store_name, key_hash, method, url, status, headers_json, body, cached_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(store_name, key_hash) DO UPDATE SET
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            cached_at = excluded.cached_at",
        params![
            store,
            &entry.key_hash,
            &entry.method,
            &entry.url,
            entry.status,
            &entry.headers_json,
            &entry.body,
            now,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Open a store by name, creating it if absent. Idempotent.
    pub async fn open_store(&self, name: &str) -> Result<Store, Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("store name cannot be empty".into()));
        }

        let owned = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> { ensure_store(conn, &owned) })
            .await
            .map_err(Error::from)?;

        Ok(Store { db: self.clone(), name: name.to_string() })
    }

    /// Names of all existing stores, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
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

    /// Delete a store and every entry in it.
    ///
    /// Returns whether a store with that name existed.
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
}

impl Store {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or replace the response for `key`.
    ///
    /// Recreates the store row if the store was deleted behind this handle.
    pub async fn put(&self, key: &RequestKey, response: &CapturedResponse) -> Result<(), Error> {
        let entry = EncodedEntry::encode(key, response)?;
        let store = self.name.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                ensure_store(conn, &store)?;
                insert_entry(conn, &store, &entry, &now)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert all entries in one transaction: either every entry lands or none does.
    pub async fn put_all(&self, entries: &[(RequestKey, CapturedResponse)]) -> Result<(), Error> {
        let encoded = entries
            .iter()
            .map(|(key, response)| EncodedEntry::encode(key, response))
            .collect::<Result<Vec<_>, _>>()?;
        let store = self.name.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &store)?;
                for entry in &encoded {
                    insert_entry(&tx, &store, entry, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the response stored for `key`.
    pub async fn match_request(&self, key: &RequestKey) -> Result<Option<CapturedResponse>, Error> {
        let store = self.name.clone();
        let key_hash = key.digest();

        self.db
            .conn
            .call(move |conn| -> Result<Option<CapturedResponse>, Error> {
                let result = conn.query_row(
                    "SELECT status, headers_json, body FROM entries WHERE store_name = ?1 AND key_hash = ?2",
                    params![store, key_hash],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                );

                let (status, headers_json, body) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let status =
                    u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status out of range: {status}")))?;
                let headers = serde_json::from_str(&headers_json)
                    .map_err(|e| Error::CorruptEntry(format!("failed to decode headers: {e}")))?;

                Ok(Some(CapturedResponse { status, headers, body }))
            })
            .await
            .map_err(Error::from)
    }

    /// All request identities in this store, in insertion order.
    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE store_name = ?1 ORDER BY rowid")?;
                let keys = stmt
                    .query_map(params![store], |row| {
                        Ok(RequestKey::from_stored(row.get(0)?, row.get(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn len(&self) -> Result<usize, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE store_name = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}
