//! Crunchbase organization profiles, located through search.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{info, instrument, warn};

use orgscout_crawler::{FetchOptions, PageFetcher, SocialNetwork, extract_emails};
use orgscout_matching::{EmailDecider, contains_company_name, filter_job_application};
use orgscout_shared::{OrgScoutError, OrganizationFacts, Result, SearchHit, SocialLinks};

use super::{MailboxValidator, OrganizationSource, non_empty, parse_year, selector, strip_tags, text_of};
use crate::finder::LinkFinder;

static DETAILS: LazyLock<Selector> =
    LazyLock::new(|| selector("#overview_default_view + section-card .section-content"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| selector(".description"));
static FOUNDED: LazyLock<Selector> = LazyLock::new(|| selector(".field-type-date_precision"));
static INDUSTRY: LazyLock<Selector> = LazyLock::new(|| selector(".cb-overflow-ellipsis"));
static EMPLOYEES: LazyLock<Selector> =
    LazyLock::new(|| selector(r#".field-type-enum[href^="/search/people"]"#));
static LINKEDIN: LazyLock<Selector> =
    LazyLock::new(|| selector(".section-content-wrapper [href*='linkedin.com']"));
static TWITTER: LazyLock<Selector> =
    LazyLock::new(|| selector(".section-content-wrapper [href*='twitter.com']"));
static FACEBOOK: LazyLock<Selector> =
    LazyLock::new(|| selector(".section-content-wrapper [href*='facebook.com']"));

pub struct Crunchbase {
    finder: LinkFinder,
    fetcher: Arc<dyn PageFetcher>,
    validator: Arc<dyn MailboxValidator>,
    decider: EmailDecider,
}

impl Crunchbase {
    pub fn new(
        finder: LinkFinder,
        fetcher: Arc<dyn PageFetcher>,
        validator: Arc<dyn MailboxValidator>,
        decider: EmailDecider,
    ) -> Self {
        Self {
            finder,
            fetcher,
            validator,
            decider,
        }
    }

    /// Profile link: a crunchbase result whose snippet names the company.
    fn pick_profile(hits: &[SearchHit], company_name: &str) -> Option<String> {
        hits.iter()
            .find(|hit| {
                hit.link.contains("crunchbase")
                    && contains_company_name(&strip_tags(&hit.description), company_name)
            })
            .map(|hit| hit.link.clone())
    }

    /// Emails in the overview block that pass mailbox validation and both
    /// email filters.
    async fn verified_emails(&self, candidates: Vec<String>, company_name: &str) -> Result<Vec<String>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let verdicts = self.validator.validate(&candidates).await?;
        let valid: Vec<String> = candidates
            .into_iter()
            .filter(|email| match verdicts.get(email) {
                Some(true) => true,
                Some(false) => {
                    warn!(%email, "mailbox validation returned false");
                    false
                }
                None => {
                    warn!(%email, "email could not be validated");
                    false
                }
            })
            .collect();

        let emails = self
            .decider
            .filter_related(&filter_job_application(&valid), company_name);
        if !emails.is_empty() {
            info!(count = emails.len(), "found emails suitable for job applications");
        }
        Ok(emails)
    }
}

/// Everything but the emails, which need async validation.
fn parse_profile(html: &str) -> (OrganizationFacts, Vec<String>) {
    let document = Html::parse_document(html);
    let details = document.select(&DETAILS).next();

    let href = |selector: &Selector, network: SocialNetwork| {
        document
            .select(selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .filter(|link| network.matches(link))
            .map(str::to_string)
    };

    let facts = OrganizationFacts {
        founded_year: details
            .and_then(|d| d.select(&FOUNDED).next())
            .and_then(|node| parse_year(&text_of(node))),
        industries: details
            .map(|d| d.select(&INDUSTRY).map(text_of).filter(|t| !t.is_empty()).collect())
            .unwrap_or_default(),
        employees: document.select(&EMPLOYEES).next().map(text_of).and_then(non_empty),
        description: document.select(&DESCRIPTION).next().map(text_of).and_then(non_empty),
        social: SocialLinks {
            linkedin: href(&LINKEDIN, SocialNetwork::LinkedIn),
            twitter: href(&TWITTER, SocialNetwork::Twitter),
            facebook: href(&FACEBOOK, SocialNetwork::Facebook),
        },
        ..Default::default()
    };

    let emails = details
        .map(|d| extract_emails(&text_of(d)))
        .unwrap_or_default();
    (facts, emails)
}

#[async_trait]
impl OrganizationSource for Crunchbase {
    fn name(&self) -> &str {
        "crunchbase"
    }

    #[instrument(skip_all, fields(provider = "crunchbase", company = %company_name))]
    async fn lookup(&self, company_name: &str, locale: Option<&str>) -> Result<Option<OrganizationFacts>> {
        info!("trying to obtain data from crunchbase");

        let query = format!("crunchbase {company_name}");
        let Some(profile) = self
            .finder
            .find(&query, locale, |hits| Self::pick_profile(hits, company_name))
            .await
        else {
            return Ok(None);
        };

        let html = match self.fetcher.fetch(&profile, &FetchOptions::proxied()).await {
            Ok(html) => html,
            Err(e) if e.is_transient() => {
                warn!(url = %profile, error = %e, "crunchbase profile unreachable");
                return Ok(None);
            }
            Err(e) => return Err(OrgScoutError::provider("crunchbase", e.to_string())),
        };

        let (mut facts, candidates) = parse_profile(&html);
        facts.emails = self.verified_emails(candidates, company_name).await?;
        Ok(Some(facts))
    }
}
