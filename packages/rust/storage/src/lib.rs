//! Website content cache backed by libSQL (offline mode).
//!
//! Fetched pages are grouped by host so that several URLs of one company
//! site share a record. Records expire by a host-scoped TTL, enforced only
//! by [`WebsiteCache::remove_expired`]; lookups never look at expiry.
//!
//! [`Storage`] is the persistent implementation, [`MemoryCache`] the
//! in-process one used by tests and one-off runs.

mod memory;
mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use libsql::{Connection, Database, params};
use orgscout_shared::urls::host_of;
use orgscout_shared::{CachedSite, OrgScoutError, Result};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub use memory::MemoryCache;

/// Host-keyed store of fetched page content.
#[async_trait]
pub trait WebsiteCache: Send + Sync {
    /// Cache `content` under the exact `url`. A URL that is already cached
    /// keeps its first content. Fails when no host can be extracted.
    async fn store(&self, url: &str, content: &str) -> Result<()>;

    /// All cached pages for the host of `url`.
    async fn retrieve(&self, url: &str) -> Result<Option<CachedSite>>;

    /// Drop hosts whose TTL has elapsed. Returns the number removed.
    async fn remove_expired(&self) -> Result<u64>;
}

/// Extract the cache key for a URL that is about to be written.
pub(crate) fn host_key(url: &str) -> Result<String> {
    host_of(url).ok_or_else(|| OrgScoutError::InvalidUrl(format!("no host in '{url}'")))
}

/// Timestamps are stored in a fixed RFC 3339 shape so they compare lexically.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    /// Owns the file handle behind `conn`; never read directly.
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    ttl: Duration,
    /// Serializes read-modify-write cycles on host rows.
    write_lock: Mutex<()>,
}

impl Storage {
    /// Open or create a database at `path`.
    pub async fn open(path: &Path, ttl: Duration) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OrgScoutError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| OrgScoutError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| OrgScoutError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            ttl,
            write_lock: Mutex::new(()),
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        OrgScoutError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    async fn load_site(&self, host: &str) -> Result<Option<CachedSite>> {
        let mut rows = self
            .conn
            .query(
                "SELECT pages_json FROM website_cache WHERE host = ?1",
                params![host],
            )
            .await
            .map_err(|e| OrgScoutError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_site(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(OrgScoutError::Storage(e.to_string())),
        }
    }

    async fn save_site(&self, site: &CachedSite, now: DateTime<Utc>) -> Result<()> {
        let pages_json = serde_json::to_string(site)
            .map_err(|e| OrgScoutError::Storage(format!("serialize cached site: {e}")))?;
        let created_at = timestamp(now);
        let expires_at = timestamp(now + self.ttl);

        self.conn
            .execute(
                "INSERT INTO website_cache (host, pages_json, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(host) DO UPDATE SET
                    pages_json = excluded.pages_json,
                    expires_at = excluded.expires_at",
                params![
                    site.host.as_str(),
                    pages_json.as_str(),
                    created_at.as_str(),
                    expires_at.as_str()
                ],
            )
            .await
            .map_err(|e| OrgScoutError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Remove hosts that expired before `now`.
    pub(crate) async fn remove_expired_before(&self, now: DateTime<Utc>) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let now = timestamp(now);
        let removed = self
            .conn
            .execute(
                "DELETE FROM website_cache WHERE expires_at <= ?1",
                params![now.as_str()],
            )
            .await
            .map_err(|e| OrgScoutError::Storage(e.to_string()))?;
        Ok(removed)
    }
}

#[async_trait]
impl WebsiteCache for Storage {
    async fn store(&self, url: &str, content: &str) -> Result<()> {
        let host = host_key(url)?;

        let _guard = self.write_lock.lock().await;
        let mut site = self
            .load_site(&host)
            .await?
            .unwrap_or_else(|| CachedSite::new(&host));

        if !site.add_page(url, content) {
            debug!(%host, url, "url already cached, keeping first content");
            return Ok(());
        }

        self.save_site(&site, Utc::now()).await?;
        debug!(%host, url, pages = site.len(), "cached page");
        Ok(())
    }

    async fn retrieve(&self, url: &str) -> Result<Option<CachedSite>> {
        let Some(host) = host_of(url) else {
            return Ok(None);
        };
        self.load_site(&host).await
    }

    async fn remove_expired(&self) -> Result<u64> {
        let removed = self.remove_expired_before(Utc::now()).await?;
        info!(removed, "pruned expired cached websites");
        Ok(removed)
    }
}

/// Convert a libSQL row into a [`CachedSite`].
fn row_to_site(row: &libsql::Row) -> Result<CachedSite> {
    let pages_json = row
        .get::<String>(0)
        .map_err(|e| OrgScoutError::Storage(e.to_string()))?;
    serde_json::from_str(&pages_json)
        .map_err(|e| OrgScoutError::Storage(format!("corrupt cached site: {e}")))
}
