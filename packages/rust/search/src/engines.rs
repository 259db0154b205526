//! Free HTML search engines scraped through a [`PageFetcher`].

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::instrument;
use url::Url;

use orgscout_crawler::{FetchOptions, PageFetcher};
use orgscout_shared::{OrgScoutError, Result, SearchHit};

use crate::SearchEngine;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn search_url(base_url: &str, path: &str, query: &str) -> Result<String> {
    let mut url = Url::parse(base_url)
        .and_then(|base| base.join(path))
        .map_err(|e| OrgScoutError::InvalidUrl(format!("{base_url}: {e}")))?;
    url.query_pairs_mut().append_pair("q", query);
    Ok(url.into())
}

// ---------------------------------------------------------------------------
// DuckDuckGo
// ---------------------------------------------------------------------------

/// DuckDuckGo's JavaScript-free results page.
pub struct DuckDuckGoHtml {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl DuckDuckGoHtml {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            base_url: "https://html.duckduckgo.com/".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn parse(&self, html: &str) -> Vec<SearchHit> {
        static RESULT: LazyLock<Selector> = LazyLock::new(|| selector("div.result"));
        static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a.result__a"));
        static SNIPPET: LazyLock<Selector> = LazyLock::new(|| selector(".result__snippet"));

        let document = Html::parse_document(html);
        document
            .select(&RESULT)
            .filter(|result| !result.value().classes().any(|class| class == "result--ad"))
            .filter_map(|result| {
                let href = result.select(&LINK).next()?.value().attr("href")?;
                let link = self.resolve_redirect(href)?;
                let description = result.select(&SNIPPET).next().map(text_of).unwrap_or_default();
                Some(SearchHit::new(link, description))
            })
            .collect()
    }

    /// Result links go through `/l/?uddg=<target>`; unwrap them.
    fn resolve_redirect(&self, href: &str) -> Option<String> {
        let absolute = Url::parse(&self.base_url).ok()?.join(href).ok()?;
        let target = absolute
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned());
        match target {
            Some(target) => Some(target),
            None if href.starts_with("http") => Some(href.to_string()),
            None => None,
        }
    }
}

#[async_trait]
impl SearchEngine for DuckDuckGoHtml {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    #[instrument(skip_all, fields(engine = "duckduckgo", query = %query))]
    async fn query(&self, query: &str) -> Result<Vec<SearchHit>> {
        let url = search_url(&self.base_url, "html/", query)?;
        let html = self.fetcher.fetch(&url, &FetchOptions::default()).await?;
        Ok(self.parse(&html))
    }
}

// ---------------------------------------------------------------------------
// Bing
// ---------------------------------------------------------------------------

/// Bing's server-rendered results page.
pub struct BingHtml {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl BingHtml {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            base_url: "https://www.bing.com/".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn parse(html: &str) -> Vec<SearchHit> {
        static RESULT: LazyLock<Selector> = LazyLock::new(|| selector("li.b_algo"));
        static LINK: LazyLock<Selector> = LazyLock::new(|| selector("h2 a[href]"));
        static CAPTION: LazyLock<Selector> = LazyLock::new(|| selector(".b_caption p, p"));

        let document = Html::parse_document(html);
        document
            .select(&RESULT)
            .filter_map(|result| {
                let link = result.select(&LINK).next()?.value().attr("href")?;
                if !link.starts_with("http") {
                    return None;
                }
                let description = result.select(&CAPTION).next().map(text_of).unwrap_or_default();
                Some(SearchHit::new(link, description))
            })
            .collect()
    }
}

#[async_trait]
impl SearchEngine for BingHtml {
    fn name(&self) -> &str {
        "bing"
    }

    #[instrument(skip_all, fields(engine = "bing", query = %query))]
    async fn query(&self, query: &str) -> Result<Vec<SearchHit>> {
        let url = search_url(&self.base_url, "search", query)?;
        let html = self.fetcher.fetch(&url, &FetchOptions::default()).await?;
        Ok(Self::parse(&html))
    }
}
