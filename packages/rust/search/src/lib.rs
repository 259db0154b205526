//! Search engine abstraction.
//!
//! Free engines are tried in priority order through an [`EngineCursor`]; a
//! metered [`PaidSearch`] channel is the last resort. Each discovery step
//! takes a fresh cursor, so no "current engine" state outlives a loop.

mod engines;
mod paid;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use orgscout_crawler::PageFetcher;
use orgscout_shared::{OrgScoutError, Result, SearchConfig, SearchHit};

pub use engines::{BingHtml, DuckDuckGoHtml};
pub use paid::{SerpApiSearch, country_code};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A free search engine that turns a query into result links.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn query(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// A metered search channel. Always available, used only as a fallback.
#[async_trait]
pub trait PaidSearch: Send + Sync {
    /// `locale` is a three-letter country code such as `DEU`.
    async fn query(&self, query: &str, locale: Option<&str>) -> Result<Vec<SearchHit>>;
}

// ---------------------------------------------------------------------------
// Engine registry and cursor
// ---------------------------------------------------------------------------

/// Ordered set of free engines plus result filtering shared by all of them.
#[derive(Clone, Default)]
pub struct SearchEngines {
    engines: Vec<Arc<dyn SearchEngine>>,
    excluded_filetypes: Vec<String>,
}

impl SearchEngines {
    pub fn new(engines: Vec<Arc<dyn SearchEngine>>, excluded_filetypes: Vec<String>) -> Self {
        Self {
            engines,
            excluded_filetypes,
        }
    }

    /// Build the engines named in `[search] engines`, in that order.
    pub fn from_config(config: &SearchConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let engines = config
            .engines
            .iter()
            .map(|name| -> Result<Arc<dyn SearchEngine>> {
                match name.as_str() {
                    "duckduckgo" => Ok(Arc::new(DuckDuckGoHtml::new(fetcher.clone()))),
                    "bing" => Ok(Arc::new(BingHtml::new(fetcher.clone()))),
                    other => Err(OrgScoutError::config(format!(
                        "unknown search engine '{other}': expected 'duckduckgo' or 'bing'"
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(engines, config.excluded_filetypes.clone()))
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// A cursor positioned before the first engine.
    pub fn cursor(&self) -> EngineCursor<'_> {
        EngineCursor {
            engines: &self.engines,
            excluded_filetypes: &self.excluded_filetypes,
            position: None,
        }
    }

    /// Drop hits linking to excluded file types (`.pdf` by default).
    pub fn drop_excluded(&self, hits: Vec<SearchHit>) -> Vec<SearchHit> {
        drop_excluded_filetypes(hits, &self.excluded_filetypes)
    }
}

/// Explicit iteration state over [`SearchEngines`].
pub struct EngineCursor<'a> {
    engines: &'a [Arc<dyn SearchEngine>],
    excluded_filetypes: &'a [String],
    position: Option<usize>,
}

impl EngineCursor<'_> {
    /// Whether [`advance`](Self::advance) would move to another engine.
    pub fn has_next(&self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        next < self.engines.len()
    }

    /// Move to the next engine. Returns `false` when exhausted.
    pub fn advance(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.position = Some(self.position.map_or(0, |p| p + 1));
        true
    }

    /// Name of the engine the cursor points at.
    pub fn current_name(&self) -> Option<&str> {
        self.position
            .and_then(|p| self.engines.get(p))
            .map(|engine| engine.name())
    }

    /// Query the current engine, dropping excluded file types.
    pub async fn query(&self, query: &str) -> Result<Vec<SearchHit>> {
        let engine = self
            .position
            .and_then(|p| self.engines.get(p))
            .ok_or_else(|| OrgScoutError::validation("engine cursor is not positioned"))?;

        let hits = engine.query(query).await?;
        debug!(engine = engine.name(), query, hits = hits.len(), "search results");
        Ok(drop_excluded_filetypes(hits, self.excluded_filetypes))
    }

    /// Back to the initial position, before the first engine.
    pub fn reset(&mut self) {
        self.position = None;
    }
}

/// Drop hits whose link path ends in one of `filetypes` (case-insensitive).
pub fn drop_excluded_filetypes(hits: Vec<SearchHit>, filetypes: &[String]) -> Vec<SearchHit> {
    hits.into_iter()
        .filter(|hit| {
            let path = hit
                .link
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_lowercase();
            !filetypes
                .iter()
                .any(|ext| path.ends_with(&format!(".{}", ext.to_lowercase())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEngine {
        name: &'static str,
        hits: Vec<SearchHit>,
    }

    #[async_trait]
    impl SearchEngine for FixedEngine {
        fn name(&self) -> &str {
            self.name
        }

        async fn query(&self, _query: &str) -> Result<Vec<SearchHit>> {
            Ok(self.hits.clone())
        }
    }

    fn engines() -> SearchEngines {
        SearchEngines::new(
            vec![
                Arc::new(FixedEngine {
                    name: "first",
                    hits: vec![
                        SearchHit::new("https://acme.de/kontakt", "Kontakt"),
                        SearchHit::new("https://acme.de/Broschuere.PDF", "Broschüre"),
                    ],
                }),
                Arc::new(FixedEngine {
                    name: "second",
                    hits: vec![],
                }),
            ],
            vec!["pdf".into()],
        )
    }

    #[test]
    fn cursor_walks_engines_in_order() {
        let engines = engines();
        let mut cursor = engines.cursor();
        assert!(cursor.current_name().is_none());
        assert!(cursor.has_next());

        assert!(cursor.advance());
        assert_eq!(cursor.current_name(), Some("first"));
        assert!(cursor.advance());
        assert_eq!(cursor.current_name(), Some("second"));
        assert!(!cursor.has_next());
        assert!(!cursor.advance());

        cursor.reset();
        assert!(cursor.current_name().is_none());
        assert!(cursor.has_next());
    }

    #[tokio::test]
    async fn cursor_query_filters_excluded_filetypes() {
        let engines = engines();
        let mut cursor = engines.cursor();
        assert!(cursor.query("acme").await.is_err());

        cursor.advance();
        let hits = cursor.query("acme email").await.expect("query");
        assert_eq!(hits, vec![SearchHit::new("https://acme.de/kontakt", "Kontakt")]);
    }

    #[test]
    fn unknown_engine_name_is_a_config_error() {
        struct NoFetch;

        #[async_trait]
        impl PageFetcher for NoFetch {
            async fn fetch(
                &self,
                url: &str,
                _options: &orgscout_crawler::FetchOptions,
            ) -> std::result::Result<String, orgscout_crawler::FetchError> {
                Err(orgscout_crawler::FetchError::Blocked {
                    url: url.to_string(),
                })
            }
        }

        let config = SearchConfig {
            engines: vec!["duckduckgo".into(), "altavista".into()],
            ..SearchConfig::default()
        };
        let err = SearchEngines::from_config(&config, Arc::new(NoFetch))
            .err()
            .expect("unknown engine");
        assert!(err.to_string().contains("altavista"));

        let ok = SearchEngines::from_config(&SearchConfig::default(), Arc::new(NoFetch))
            .expect("default engines");
        assert_eq!(ok.len(), 2);
    }
}
