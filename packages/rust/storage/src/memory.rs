//! In-process [`WebsiteCache`] implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use orgscout_shared::urls::host_of;
use orgscout_shared::{CachedSite, OrgScoutError, Result};
use tracing::debug;

use crate::{WebsiteCache, host_key};

/// Host -> (site, expiry).
type Sites = HashMap<String, (CachedSite, DateTime<Utc>)>;

/// Cache held in a mutex-guarded map. Contents are lost on drop.
pub struct MemoryCache {
    ttl: Duration,
    sites: Mutex<Sites>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sites: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Sites>> {
        self.sites
            .lock()
            .map_err(|_| OrgScoutError::Storage("memory cache lock poisoned".into()))
    }

    fn remove_expired_before(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut sites = self.lock()?;
        let before = sites.len();
        sites.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - sites.len()) as u64)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(Duration::days(30))
    }
}

#[async_trait]
impl WebsiteCache for MemoryCache {
    async fn store(&self, url: &str, content: &str) -> Result<()> {
        let host = host_key(url)?;
        let expires_at = Utc::now() + self.ttl;

        let mut sites = self.lock()?;
        let (site, expiry) = sites
            .entry(host.clone())
            .or_insert_with(|| (CachedSite::new(&host), expires_at));
        if site.add_page(url, content) {
            *expiry = expires_at;
            debug!(%host, url, "cached page in memory");
        }
        Ok(())
    }

    async fn retrieve(&self, url: &str) -> Result<Option<CachedSite>> {
        let Some(host) = host_of(url) else {
            return Ok(None);
        };
        Ok(self.lock()?.get(&host).map(|(site, _)| site.clone()))
    }

    async fn remove_expired(&self) -> Result<u64> {
        self.remove_expired_before(Utc::now())
    }
}
