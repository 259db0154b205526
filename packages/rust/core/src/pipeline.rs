//! End-to-end `enrich` pipeline: company name → emails → organization
//! facts → social links → [`CompanyRecord`].

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use orgscout_crawler::{HttpFetcher, PageFetcher, SocialNetwork};
use orgscout_matching::{EmailDecider, NameMatcher, rank_preferred};
use orgscout_search::{PaidSearch, SearchEngines, SerpApiSearch};
use orgscout_shared::{
    AppConfig, CompanyRecord, EmailBatch, OrgScoutError, OrganizationFacts, Result,
    resolve_serpapi_key,
};
use orgscout_storage::WebsiteCache;

use crate::discovery::EmailDiscovery;
use crate::finder::LinkFinder;
use crate::link_extractor::LinkEmailExtractor;
use crate::providers::{
    AcceptAllValidator, Crunchbase, DunAndBradstreet, OrganizationSource, ProviderRegistry,
};
use crate::result_extractor::SearchResultEmailExtractor;
use crate::social::LinkedInResolver;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the record is complete.
    fn done(&self, record: &CompanyRecord);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _record: &CompanyRecord) {}
}

/// Who to enrich.
#[derive(Debug, Clone, Default)]
pub struct EnrichRequest {
    pub name: String,
    pub location: Option<String>,
    /// Three-letter country code, e.g. `DEU`.
    pub locale: Option<String>,
}

impl EnrichRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

pub struct Enricher {
    discovery: EmailDiscovery,
    providers: ProviderRegistry,
    linkedin: LinkedInResolver,
}

impl Enricher {
    pub fn new(discovery: EmailDiscovery, providers: ProviderRegistry, linkedin: LinkedInResolver) -> Self {
        Self {
            discovery,
            providers,
            linkedin,
        }
    }

    /// Wire the HTTP-backed stages from config around `cache`.
    pub fn from_config(config: &AppConfig, cache: Arc<dyn WebsiteCache>) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.fetch)?);
        let engines = SearchEngines::from_config(&config.search, fetcher.clone())?;

        let paid: Option<Arc<dyn PaidSearch>> = match resolve_serpapi_key(config) {
            Some(key) => Some(Arc::new(SerpApiSearch::new(key, &config.fetch)?)),
            None => {
                warn!(
                    env = %config.search.serpapi_key_env,
                    "no paid search key configured, paid fallback disabled"
                );
                None
            }
        };

        let decider = EmailDecider::new(NameMatcher::from(&config.matching));
        let links = LinkEmailExtractor::new(fetcher.clone(), cache.clone(), decider.clone());
        let discovery = EmailDiscovery::new(
            engines.clone(),
            paid.clone(),
            SearchResultEmailExtractor::new(links),
        );

        let finder = LinkFinder::new(engines, paid);
        let sources: Vec<Arc<dyn OrganizationSource>> = vec![
            Arc::new(Crunchbase::new(
                finder.clone(),
                fetcher.clone(),
                Arc::new(AcceptAllValidator),
                decider,
            )),
            Arc::new(DunAndBradstreet::new(fetcher.clone(), &config.fetch)?),
        ];
        let providers = ProviderRegistry::allowed(sources, &config.providers);
        let linkedin = LinkedInResolver::new(cache, fetcher, finder);

        Ok(Self::new(discovery, providers, linkedin))
    }

    /// Run every stage for one company.
    ///
    /// Stages degrade rather than abort, but anything that does escape is
    /// returned as a single [`OrgScoutError::ProviderFailure`] and no
    /// partial record is produced.
    #[instrument(skip_all, fields(company = %request.name))]
    pub async fn enrich(
        &self,
        request: &EnrichRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<CompanyRecord> {
        if request.name.trim().is_empty() {
            return Err(OrgScoutError::validation("company name must not be empty"));
        }

        let start = Instant::now();
        let record = self
            .run(request, progress)
            .await
            .map_err(OrgScoutError::provider_failure)?;

        info!(
            website = record.website.as_deref().unwrap_or_default(),
            job_application_emails = record.job_application_emails.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "enrichment complete"
        );
        progress.done(&record);
        Ok(record)
    }

    async fn run(&self, request: &EnrichRequest, progress: &dyn ProgressReporter) -> Result<CompanyRecord> {
        let name = request.name.trim();
        let locale = request.locale.as_deref();
        let mut record = CompanyRecord::new(name)
            .with_location(request.location.clone())
            .with_locale(request.locale.clone());

        // --- Phase 1: Emails from the company website ---
        progress.phase("Discovering emails");
        if let Some(batch) = self
            .discovery
            .discover_emails(name, record.location.as_deref(), locale)
            .await?
        {
            fill_from_emails(&mut record, batch);
        }

        // --- Phase 2: Organization providers ---
        progress.phase("Querying organization providers");
        let facts = self.providers.first_facts(name, locale).await;
        let known_linkedin = facts.as_ref().and_then(|(_, f)| f.social.linkedin.clone());
        if let Some((provider, facts)) = facts {
            info!(%provider, "using organization facts");
            fill_from_organization(&mut record, facts);
        }

        // --- Phase 3: Social links ---
        progress.phase("Resolving social links");
        record.social.linkedin = self
            .linkedin
            .resolve(name, record.website.as_deref(), known_linkedin.as_deref())
            .await?;

        record.job_application_emails = rank_preferred(&record.job_application_emails);
        Ok(record)
    }
}

/// Website only when still unknown; email sets are unioned.
fn fill_from_emails(record: &mut CompanyRecord, batch: EmailBatch) {
    if let Some(host) = batch.used_website_host() {
        record.set_website_if_empty(host);
    }
    record.add_emails(batch.emails);
    record.add_job_application_emails(batch.job_application_emails);
}

/// The provider website is a last resort; social links must look like
/// profiles on their network.
fn fill_from_organization(record: &mut CompanyRecord, facts: OrganizationFacts) {
    record.add_job_application_emails(facts.emails);

    if let Some(website) = facts.website {
        record.set_website_if_empty(website);
    }

    if let Some(twitter) = facts.social.twitter.filter(|l| SocialNetwork::Twitter.matches(l)) {
        record.social.twitter = Some(twitter);
    }
    if let Some(facebook) = facts.social.facebook.filter(|l| SocialNetwork::Facebook.matches(l)) {
        record.social.facebook = Some(facebook);
    }

    record.industries = facts.industries;
    record.founded_year = facts.founded_year;
    record.description = facts.description;
    record.employees = facts.employees;
}
