//! LinkedIn company profile resolution.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use orgscout_crawler::{FetchOptions, PageFetcher, SocialNetwork};
use orgscout_matching::contains_company_name;
use orgscout_shared::urls::with_scheme;
use orgscout_shared::{Result, SearchHit};
use orgscout_storage::WebsiteCache;

use crate::finder::LinkFinder;

/// Finds a company's LinkedIn page from, in order: a link a provider
/// already knows, the company website, a dedicated search.
pub struct LinkedInResolver {
    cache: Arc<dyn WebsiteCache>,
    fetcher: Arc<dyn PageFetcher>,
    finder: LinkFinder,
}

impl LinkedInResolver {
    pub fn new(cache: Arc<dyn WebsiteCache>, fetcher: Arc<dyn PageFetcher>, finder: LinkFinder) -> Self {
        Self {
            cache,
            fetcher,
            finder,
        }
    }

    /// Only `linkedin.com/company/...` links are ever returned.
    #[instrument(skip_all, fields(company = %company_name))]
    pub async fn resolve(
        &self,
        company_name: &str,
        website: Option<&str>,
        known: Option<&str>,
    ) -> Result<Option<String>> {
        let mut link = known.map(str::to_string);

        if link.is_none() {
            if let Some(website) = website {
                link = self
                    .website_content(website)
                    .await?
                    .and_then(|html| SocialNetwork::LinkedIn.find_in_html(&html));
            }
        }

        if link.is_none() {
            info!("searching for linkedin company profile");
            let query = format!("{company_name} linkedin");
            link = self
                .finder
                .find(&query, None, |hits| pick_profile(hits, company_name))
                .await;
        }

        Ok(link.filter(|l| {
            let accepted = SocialNetwork::LinkedIn.matches(l);
            if !accepted {
                debug!(link = %l, "not a linkedin company profile");
            }
            accepted
        }))
    }

    /// Any cached page of the website, or a fresh fetch of it. Social links
    /// usually sit in the header or footer of every page.
    async fn website_content(&self, website: &str) -> Result<Option<String>> {
        if let Some(site) = self.cache.retrieve(website).await? {
            if let Some(content) = site.first_content() {
                return Ok(Some(content.to_string()));
            }
        }

        match self.fetcher.fetch(&with_scheme(website), &FetchOptions::default()).await {
            Ok(html) => Ok(Some(html)),
            Err(e) => {
                warn!(%website, error = %e, "could not get website content");
                Ok(None)
            }
        }
    }
}

/// LinkedIn result mentioning the company, preferring company pages.
fn pick_profile(hits: &[SearchHit], company_name: &str) -> Option<String> {
    let mentioned: Vec<&SearchHit> = hits
        .iter()
        .filter(|hit| {
            hit.link.contains("linkedin")
                && (contains_company_name(&hit.description, company_name)
                    || contains_company_name(&hit.link, company_name))
        })
        .collect();

    mentioned
        .iter()
        .find(|hit| hit.link.contains("company"))
        .or_else(|| mentioned.first())
        .map(|hit| hit.link.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEngine, FakeFetcher, engines};
    use orgscout_storage::MemoryCache;

    fn resolver(cache: Arc<MemoryCache>, fetcher: FakeFetcher, engine: FakeEngine) -> LinkedInResolver {
        LinkedInResolver::new(
            cache,
            Arc::new(fetcher),
            LinkFinder::new(engines(vec![engine]), None),
        )
    }

    #[test]
    fn prefers_company_pages() {
        let hits = [
            SearchHit::new("https://www.linkedin.com/in/jane-doe", "Jane Doe - CEO at Acme Solutions"),
            SearchHit::new("https://acme-solutions.de/", "Acme Solutions"),
            SearchHit::new("https://de.linkedin.com/company/acme-solutions", "Acme Solutions GmbH"),
        ];
        assert_eq!(
            pick_profile(&hits, "Acme Solutions GmbH").as_deref(),
            Some("https://de.linkedin.com/company/acme-solutions")
        );
    }

    #[tokio::test]
    async fn known_link_is_validated() {
        let resolver = resolver(
            Arc::new(MemoryCache::default()),
            FakeFetcher::default(),
            FakeEngine::new("empty"),
        );
        let link = resolver
            .resolve("Acme", None, Some("https://www.linkedin.com/company/acme"))
            .await
            .expect("resolve");
        assert_eq!(link.as_deref(), Some("https://www.linkedin.com/company/acme"));
    }

    #[tokio::test]
    async fn reads_cached_website_first() {
        let cache = Arc::new(MemoryCache::default());
        cache
            .store(
                "https://acme-solutions.de/kontakt",
                r#"<footer><a href="https://www.linkedin.com/company/acme-solutions/">in</a></footer>"#,
            )
            .await
            .expect("seed");
        let fetcher = FakeFetcher::default();
        let resolver = resolver(cache, fetcher, FakeEngine::new("empty"));

        let link = resolver
            .resolve("Acme Solutions GmbH", Some("acme-solutions.de"), None)
            .await
            .expect("resolve");
        assert_eq!(link.as_deref(), Some("https://www.linkedin.com/company/acme-solutions/"));
    }

    #[tokio::test]
    async fn search_result_must_be_a_company_profile() {
        let engine = FakeEngine::new("first").results("Acme Solutions GmbH linkedin", vec![
            SearchHit::new("https://www.linkedin.com/in/jane-doe", "Jane Doe - Acme Solutions"),
        ]);
        let resolver = resolver(Arc::new(MemoryCache::default()), FakeFetcher::default(), engine);

        let link = resolver
            .resolve("Acme Solutions GmbH", Some("acme-solutions.de"), None)
            .await
            .expect("resolve");
        assert!(link.is_none());
    }
}
