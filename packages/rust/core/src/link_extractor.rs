//! Email extraction from a single link, backed by the website cache.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use orgscout_crawler::{FetchOptions, PageFetcher, extract_emails};
use orgscout_matching::EmailDecider;
use orgscout_shared::urls::{domain_label, host_of, with_scheme};
use orgscout_shared::Result;
use orgscout_storage::WebsiteCache;

/// Outcome of searching one link for emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkExtraction {
    /// The page was read; these are the company-related emails on it
    /// (possibly none).
    Searched(Vec<String>),
    /// No page content was available: unrelated domain, transient fetch
    /// failure, or nothing cached.
    NotSearched,
    /// The link has no usable host.
    Skipped,
}

impl LinkExtraction {
    pub fn emails(&self) -> &[String] {
        match self {
            Self::Searched(emails) => emails,
            Self::NotSearched | Self::Skipped => &[],
        }
    }
}

/// Fetches (or reuses cached) pages and pulls related emails out of them.
#[derive(Clone)]
pub struct LinkEmailExtractor {
    fetcher: Arc<dyn PageFetcher>,
    cache: Arc<dyn WebsiteCache>,
    decider: EmailDecider,
}

impl LinkEmailExtractor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        cache: Arc<dyn WebsiteCache>,
        decider: EmailDecider,
    ) -> Self {
        Self {
            fetcher,
            cache,
            decider,
        }
    }

    pub fn decider(&self) -> &EmailDecider {
        &self.decider
    }

    /// Search `url` for emails related to `company_name`.
    ///
    /// With `validate_domain` the link's domain must match the company
    /// before anything is fetched. With `skip_already_crawled` an exactly
    /// cached URL is read from the cache instead of refetched.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn extract(
        &self,
        url: &str,
        company_name: &str,
        validate_domain: bool,
        skip_already_crawled: bool,
    ) -> Result<LinkExtraction> {
        if host_of(url).is_none() {
            debug!("no host, skipping link");
            return Ok(LinkExtraction::Skipped);
        }

        let cached = self.cache.retrieve(url).await?;
        let cached_exact = cached.as_ref().is_some_and(|site| site.has_exact_url(url));
        let skip_crawling = cached_exact && skip_already_crawled;

        let mut html = None;
        if !skip_crawling && (!validate_domain || self.is_domain_related(url, company_name)) {
            let target = with_scheme(url);
            info!(url = %target, "crawling link");

            match self.fetcher.fetch(&target, &FetchOptions::proxied()).await {
                Ok(page) => {
                    self.cache.store(url, &page).await?;
                    html = Some(page);
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "link could not be crawled");
                    return Ok(LinkExtraction::NotSearched);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let html = match html {
            Some(html) => html,
            None => match cached.as_ref().and_then(|site| site.content_for_url(url)) {
                Some(content) => content.to_string(),
                None => return Ok(LinkExtraction::NotSearched),
            },
        };

        let emails = extract_emails(&html);
        Ok(LinkExtraction::Searched(
            self.decider.filter_related(&emails, company_name),
        ))
    }

    fn is_domain_related(&self, url: &str, company_name: &str) -> bool {
        let label = domain_label(url).unwrap_or_default();
        self.decider.matcher().is_related(&label, company_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFetcher;
    use orgscout_storage::MemoryCache;

    const KONTAKT: &str = r#"<p>Schreiben Sie uns: kontakt@acme-solutions.de,
        bewerbung@acme-solutions.de oder agentur@webdesign-partner.de</p>"#;

    fn extractor(fetcher: Arc<FakeFetcher>, cache: Arc<MemoryCache>) -> LinkEmailExtractor {
        LinkEmailExtractor::new(fetcher, cache, EmailDecider::default())
    }

    #[tokio::test]
    async fn fetches_caches_and_filters_related() {
        let fetcher = Arc::new(FakeFetcher::default().page("https://acme-solutions.de/kontakt", KONTAKT));
        let cache = Arc::new(MemoryCache::default());
        let links = extractor(fetcher.clone(), cache.clone());

        let result = links
            .extract("https://acme-solutions.de/kontakt", "Acme Solutions GmbH", true, true)
            .await
            .expect("extract");
        assert_eq!(
            result,
            LinkExtraction::Searched(vec![
                "kontakt@acme-solutions.de".into(),
                "bewerbung@acme-solutions.de".into()
            ])
        );

        let site = cache
            .retrieve("acme-solutions.de")
            .await
            .expect("retrieve")
            .expect("cached");
        assert!(site.has_exact_url("https://acme-solutions.de/kontakt"));
    }

    #[tokio::test]
    async fn cached_url_is_not_refetched() {
        let fetcher = Arc::new(FakeFetcher::default());
        let cache = Arc::new(MemoryCache::default());
        cache
            .store("https://acme-solutions.de/kontakt", KONTAKT)
            .await
            .expect("seed");
        let links = extractor(fetcher.clone(), cache);

        let result = links
            .extract("https://acme-solutions.de/kontakt", "Acme Solutions GmbH", true, true)
            .await
            .expect("extract");
        assert_eq!(result.emails().len(), 2);
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn unrelated_domain_is_not_fetched() {
        let fetcher = Arc::new(FakeFetcher::default().page("https://www.yellowpages.example/acme", KONTAKT));
        let links = extractor(fetcher.clone(), Arc::new(MemoryCache::default()));

        let result = links
            .extract("https://www.yellowpages.example/acme", "Acme Solutions GmbH", true, true)
            .await
            .expect("extract");
        assert_eq!(result, LinkExtraction::NotSearched);
        assert!(fetcher.requests().is_empty());

        let result = links
            .extract("https://www.yellowpages.example/acme", "Acme Solutions GmbH", false, true)
            .await
            .expect("extract");
        assert_eq!(result.emails().len(), 2);
    }

    #[tokio::test]
    async fn scheme_less_host_is_fetched_over_http_and_cached_as_given() {
        let fetcher = Arc::new(FakeFetcher::default().page("http://acme-solutions.de", KONTAKT));
        let cache = Arc::new(MemoryCache::default());
        let links = extractor(fetcher.clone(), cache.clone());

        let result = links
            .extract("acme-solutions.de", "Acme Solutions GmbH", true, true)
            .await
            .expect("extract");
        assert_eq!(result.emails().len(), 2);
        assert_eq!(fetcher.requests(), vec!["http://acme-solutions.de"]);

        let site = cache.retrieve("acme-solutions.de").await.expect("retrieve").expect("cached");
        assert!(site.has_exact_url("acme-solutions.de"));
    }

    #[tokio::test]
    async fn hostless_link_is_skipped() {
        let links = extractor(Arc::new(FakeFetcher::default()), Arc::new(MemoryCache::default()));
        let result = links
            .extract("/kontakt", "Acme Solutions GmbH", true, true)
            .await
            .expect("extract");
        assert_eq!(result, LinkExtraction::Skipped);
    }

    #[tokio::test]
    async fn transient_failure_is_not_searched_but_status_errors_propagate() {
        let fetcher = Arc::new(FakeFetcher::default().status("https://acme-solutions.de/jobs", 500));
        let links = extractor(fetcher, Arc::new(MemoryCache::default()));

        let result = links
            .extract("https://acme-solutions.de/kontakt", "Acme Solutions GmbH", true, true)
            .await
            .expect("dns failure is swallowed");
        assert_eq!(result, LinkExtraction::NotSearched);

        let err = links
            .extract("https://acme-solutions.de/jobs", "Acme Solutions GmbH", true, true)
            .await
            .expect_err("500 propagates");
        assert!(err.to_string().contains("500"));
    }
}
