//! In-process fakes for the network seams, shared by the unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use orgscout_crawler::{FetchError, FetchOptions, PageFetcher};
use orgscout_search::{PaidSearch, SearchEngine, SearchEngines};
use orgscout_shared::{OrgScoutError, Result, SearchHit};

/// Serves canned pages by exact URL and records every request.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, std::result::Result<String, u16>>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(html.to_string()));
        self
    }

    /// Answer `url` with an HTTP error status.
    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), Err(status));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(
        &self,
        url: &str,
        _options: &FetchOptions,
    ) -> std::result::Result<String, FetchError> {
        self.requests.lock().expect("lock").push(url.to_string());
        match self.pages.get(url) {
            Some(Ok(html)) => Ok(html.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::DnsResolution {
                url: url.to_string(),
            }),
        }
    }
}

/// Answers queries from a fixed table and records them.
pub struct FakeEngine {
    name: &'static str,
    results: HashMap<String, Vec<SearchHit>>,
    failing: bool,
    queries: Arc<Mutex<Vec<String>>>,
}

impl FakeEngine {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            results: HashMap::new(),
            failing: false,
            queries: Arc::default(),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            failing: true,
            ..Self::new(name)
        }
    }

    pub fn results(mut self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.results.insert(query.to_string(), hits);
        self
    }

    /// Handle on the recorded queries, usable after the engine is boxed.
    pub fn query_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.queries.clone()
    }
}

#[async_trait]
impl SearchEngine for FakeEngine {
    fn name(&self) -> &str {
        self.name
    }

    async fn query(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.queries.lock().expect("lock").push(query.to_string());
        if self.failing {
            return Err(OrgScoutError::Network(format!("{} is down", self.name)));
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

/// Paid channel with canned results; records `(query, locale)` pairs.
#[derive(Default)]
pub struct FakePaid {
    results: HashMap<String, Vec<SearchHit>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl FakePaid {
    pub fn results(mut self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.results.insert(query.to_string(), hits);
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl PaidSearch for FakePaid {
    async fn query(&self, query: &str, locale: Option<&str>) -> Result<Vec<SearchHit>> {
        self.calls
            .lock()
            .expect("lock")
            .push((query.to_string(), locale.map(str::to_string)));
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

pub fn engines(engines: Vec<FakeEngine>) -> SearchEngines {
    SearchEngines::new(
        engines
            .into_iter()
            .map(|engine| Arc::new(engine) as Arc<dyn SearchEngine>)
            .collect(),
        vec!["pdf".to_string()],
    )
}
