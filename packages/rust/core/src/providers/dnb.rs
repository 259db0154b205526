//! Dun & Bradstreet: JSON company search plus the public profile page.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use reqwest::header::ACCEPT;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use orgscout_crawler::{FetchOptions, PageFetcher};
use orgscout_matching::contains_company_name;
use orgscout_shared::urls::host_of;
use orgscout_shared::{FetchConfig, OrgScoutError, OrganizationFacts, Result};

use super::{OrganizationSource, non_empty, parse_year, selector, text_of};

const SEARCH_PATH: &str = "/apps/dnb/servlets/CompanySearchServlet";
const SEARCH_RESOURCE: &str =
    "/content/dnb-us/en/home/site-search-results/jcr:content/content-ipar-cta/singlepagesearch";

/// Search requests are answered for this browser signature.
const SEARCH_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/85.0.4183.102 Safari/537.36";

/// Profile pages only render for some user agents; tried in order.
const PROFILE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 6.1; WOW64; rv:24.0) Gecko/20100101 Firefox/24.0",
    "Mozilla/5.0 (Windows NT 6.3; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/43.0.2357.130 Safari/537.36",
];

static DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"[name^="company_description"] span"#));
static WEBSITE: LazyLock<Selector> =
    LazyLock::new(|| selector(".company_profile_overview_underline_links #hero-company-link"));
static FOUNDED: LazyLock<Selector> = LazyLock::new(|| selector(r#"[name^="year_started"]"#));
static INDUSTRY: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"[name^="industry_links"] span a, [name^="industry_links"] span span span"#)
});
static EMPLOYEES: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"[name^="employees_this_site"] span, [name^="employees_all_site"] span"#)
});

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    companies: Vec<SearchCompany>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchCompany {
    primary_name: Option<String>,
    company_profile_link: Option<String>,
}

pub struct DunAndBradstreet {
    client: Client,
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
}

impl DunAndBradstreet {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(SEARCH_USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .build()
            .map_err(|e| OrgScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            fetcher,
            base_url: "https://www.dnb.com".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Profile page URL of the first search result naming the company.
    async fn profile_url(&self, company_name: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}{SEARCH_PATH}", self.base_url))
            .header(ACCEPT, "*/*")
            .query(&[
                ("pageNumber", "1"),
                ("pageSize", "25"),
                ("resourcePath", SEARCH_RESOURCE),
                ("returnNav", "true"),
                ("searchTerm", company_name),
            ])
            .send()
            .await
            .map_err(|e| OrgScoutError::provider("dnb", e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            warn!(%status, "dnb search unavailable");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(OrgScoutError::provider("dnb", format!("search returned HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OrgScoutError::provider("dnb", e.to_string()))?;
        let results: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| OrgScoutError::provider("dnb", format!("search result is not valid json: {e}")))?;

        if results.companies.is_empty() {
            warn!(company = company_name, "no dnb results");
            return Ok(None);
        }

        for company in results.companies {
            let Some(link) = company.company_profile_link.filter(|l| !l.is_empty()) else {
                error!(company = company_name, "dnb result is missing its profile link");
                continue;
            };
            let name = company.primary_name.unwrap_or_default();
            if contains_company_name(&name, company_name) {
                return Ok(Some(format!("{}{link}", self.base_url)));
            }
        }
        Ok(None)
    }

    async fn fetch_profile(&self, url: &str) -> Option<String> {
        for user_agent in PROFILE_USER_AGENTS {
            let options = FetchOptions {
                with_proxy: true,
                ..FetchOptions::with_user_agent(*user_agent)
            };
            match self.fetcher.fetch(url, &options).await {
                Ok(html) => return Some(html),
                Err(e) => {
                    error!(%url, %user_agent, error = %e, "dnb profile page failed, trying next user agent");
                }
            }
        }
        error!(%url, "could not fetch dnb profile page with any user agent");
        None
    }
}

/// Leading headcount digits, thousands separators removed.
fn parse_employees(text: &str) -> Option<String> {
    static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));
    let compact = text.replace([',', '.'], "");
    DIGITS_RE.find(&compact).map(|m| m.as_str().to_string())
}

fn parse_profile(html: &str) -> OrganizationFacts {
    let document = Html::parse_document(html);

    OrganizationFacts {
        description: document.select(&DESCRIPTION).next().map(text_of).and_then(non_empty),
        website: document
            .select(&WEBSITE)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(host_of),
        founded_year: document
            .select(&FOUNDED)
            .next()
            .and_then(|node| parse_year(&text_of(node))),
        industries: document
            .select(&INDUSTRY)
            .map(text_of)
            .filter(|t| !t.is_empty())
            .collect(),
        employees: document
            .select(&EMPLOYEES)
            .next()
            .and_then(|node| parse_employees(&text_of(node))),
        ..Default::default()
    }
}

#[async_trait]
impl OrganizationSource for DunAndBradstreet {
    fn name(&self) -> &str {
        "dnb"
    }

    #[instrument(skip_all, fields(provider = "dnb", company = %company_name))]
    async fn lookup(&self, company_name: &str, _locale: Option<&str>) -> Result<Option<OrganizationFacts>> {
        info!("trying to obtain data from dnb");

        let Some(url) = self.profile_url(company_name).await? else {
            return Ok(None);
        };
        let Some(html) = self.fetch_profile(&url).await else {
            return Ok(None);
        };
        Ok(Some(parse_profile(&html)))
    }
}
