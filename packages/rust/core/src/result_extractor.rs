//! Turns one page of search results into an [`EmailBatch`].
//!
//! Two passes: a strict one over domain-matched links that needs at least
//! one job-application email, then a loose one over the first two raw hits
//! that mention the company, accepting any email it finds.

use tracing::{debug, info};

use orgscout_matching::filter_job_application;
use orgscout_shared::urls::{canonical_key, is_valid_url};
use orgscout_shared::{EmailBatch, Result, SearchHit};

use crate::link_extractor::{LinkEmailExtractor, LinkExtraction};

/// Raw hits scanned by the loose pass.
const FALLBACK_HITS: usize = 2;

/// Links worth crawling, in result order. When the same host and query
/// appear with and without a scheme, only the scheme-bearing link is kept
/// (at the position of the first occurrence).
pub fn canonical_links(hits: &[SearchHit]) -> Vec<String> {
    let mut links: Vec<String> = Vec::with_capacity(hits.len());

    for hit in hits {
        let link = hit.link.as_str();
        let has_scheme = link.contains("://");

        if let Some(key) = canonical_key(link) {
            let duplicate = links
                .iter()
                .position(|used| canonical_key(used).as_ref() == Some(&key));

            if let Some(index) = duplicate {
                match (links[index].contains("://"), has_scheme) {
                    (false, true) => {
                        links[index] = link.to_string();
                        continue;
                    }
                    (true, false) => continue,
                    _ => {}
                }
            }
        }

        links.push(link.to_string());
    }

    links
}

#[derive(Clone)]
pub struct SearchResultEmailExtractor {
    links: LinkEmailExtractor,
}

impl SearchResultEmailExtractor {
    pub fn new(links: LinkEmailExtractor) -> Self {
        Self { links }
    }

    pub fn links(&self) -> &LinkEmailExtractor {
        &self.links
    }

    /// Search the hits of one query and record what was found in `batch`.
    pub async fn handle(
        &self,
        hits: &[SearchHit],
        batch: &mut EmailBatch,
        company_name: &str,
    ) -> Result<()> {
        if hits.is_empty() {
            return Ok(());
        }

        self.try_matching_links(hits, batch, company_name).await?;

        if !batch.has_emails() {
            self.try_first_results(hits, batch, company_name).await?;
        }
        Ok(())
    }

    async fn try_matching_links(
        &self,
        hits: &[SearchHit],
        batch: &mut EmailBatch,
        company_name: &str,
    ) -> Result<()> {
        for link in canonical_links(hits) {
            if batch.is_crawled(&link) || !is_valid_url(&link) {
                continue;
            }

            let emails = match self.links.extract(&link, company_name, true, true).await? {
                LinkExtraction::Searched(emails) => emails,
                LinkExtraction::NotSearched | LinkExtraction::Skipped => continue,
            };
            batch.mark_crawled(link.as_str());

            if filter_job_application(&emails).is_empty() {
                debug!(%link, found = emails.len(), "no job application emails on link");
                continue;
            }

            info!(%link, found = emails.len(), "found emails on matching link");
            batch.emails = emails;
            batch.used_website_url = Some(link);
            return Ok(());
        }
        Ok(())
    }

    async fn try_first_results(
        &self,
        hits: &[SearchHit],
        batch: &mut EmailBatch,
        company_name: &str,
    ) -> Result<()> {
        for hit in hits.iter().take(FALLBACK_HITS) {
            if !hit.description.contains(company_name)
                || batch.is_crawled(&hit.link)
                || !is_valid_url(&hit.link)
            {
                continue;
            }

            let extraction = self.links.extract(&hit.link, company_name, false, true).await?;
            if let LinkExtraction::Searched(emails) = extraction {
                batch.mark_crawled(hit.link.as_str());
                if !emails.is_empty() {
                    info!(link = %hit.link, found = emails.len(), "found emails on first results");
                    batch.emails = emails;
                    batch.used_website_url = Some(hit.link.clone());
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}
