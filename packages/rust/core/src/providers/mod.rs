//! Organization-data providers.
//!
//! Each provider is an [`OrganizationSource`]. The [`ProviderRegistry`]
//! asks them in priority order and keeps the first non-empty answer; later
//! providers are pure fallback.

mod crunchbase;
mod dnb;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{error, info, warn};

use orgscout_shared::{OrganizationFacts, ProvidersConfig, Result};

pub use crunchbase::Crunchbase;
pub use dnb::DunAndBradstreet;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// An external source of structured company facts.
#[async_trait]
pub trait OrganizationSource: Send + Sync {
    /// Registry name, matched against `[providers] enabled`.
    fn name(&self) -> &str;

    async fn lookup(&self, company_name: &str, locale: Option<&str>)
    -> Result<Option<OrganizationFacts>>;
}

/// Mailbox-level verification of email addresses.
#[async_trait]
pub trait MailboxValidator: Send + Sync {
    /// Verdict per address. Addresses missing from the map could not be
    /// checked.
    async fn validate(&self, emails: &[String]) -> Result<HashMap<String, bool>>;
}

/// Accepts every address without contacting a mail server.
pub struct AcceptAllValidator;

#[async_trait]
impl MailboxValidator for AcceptAllValidator {
    async fn validate(&self, emails: &[String]) -> Result<HashMap<String, bool>> {
        Ok(emails.iter().map(|email| (email.clone(), true)).collect())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    sources: Vec<Arc<dyn OrganizationSource>>,
}

impl ProviderRegistry {
    pub fn new(sources: Vec<Arc<dyn OrganizationSource>>) -> Self {
        Self { sources }
    }

    /// Keep only the sources enabled in config, preserving their order.
    pub fn allowed(sources: Vec<Arc<dyn OrganizationSource>>, config: &ProvidersConfig) -> Self {
        let sources: Vec<_> = sources
            .into_iter()
            .filter(|source| {
                let enabled = config
                    .enabled
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(source.name()));
                if !enabled {
                    warn!(provider = source.name(), "organization provider has been disabled");
                }
                enabled
            })
            .collect();

        if sources.is_empty() {
            error!("no organization provider is active, no organization data will be delivered");
        }
        Self { sources }
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Facts from the first provider that has any. Provider errors are
    /// logged and the next provider is asked.
    pub async fn first_facts(
        &self,
        company_name: &str,
        locale: Option<&str>,
    ) -> Option<(String, OrganizationFacts)> {
        for source in &self.sources {
            info!(provider = source.name(), company = company_name, "querying organization provider");
            match source.lookup(company_name, locale).await {
                Ok(Some(facts)) if !facts.is_empty() => {
                    return Some((source.name().to_string(), facts));
                }
                Ok(_) => continue,
                Err(e) => {
                    error!(provider = source.name(), error = %e, "organization provider failed");
                }
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Profile page helpers
// ---------------------------------------------------------------------------

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

/// First four-digit number in `text`.
fn parse_year(text: &str) -> Option<u16> {
    static YEAR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\b([0-9]{4})\b").expect("valid regex"));
    YEAR_RE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Remove markup from a search snippet.
fn strip_tags(text: &str) -> String {
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
    TAG_RE.replace_all(text, "").into_owned()
}

fn non_empty(text: String) -> Option<String> {
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        name: &'static str,
        answer: fn() -> Result<Option<OrganizationFacts>>,
    }

    #[async_trait]
    impl OrganizationSource for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn lookup(&self, _: &str, _: Option<&str>) -> Result<Option<OrganizationFacts>> {
            (self.answer)()
        }
    }

    fn founded(year: u16) -> Result<Option<OrganizationFacts>> {
        Ok(Some(OrganizationFacts {
            founded_year: Some(year),
            ..Default::default()
        }))
    }

    fn source(
        name: &'static str,
        answer: fn() -> Result<Option<OrganizationFacts>>,
    ) -> Arc<dyn OrganizationSource> {
        Arc::new(Fixed { name, answer })
    }

    #[tokio::test]
    async fn first_non_empty_provider_wins() {
        let registry = ProviderRegistry::new(vec![
            source("broken", || Err(orgscout_shared::OrgScoutError::provider("broken", "bad json"))),
            source("empty", || Ok(Some(OrganizationFacts::default()))),
            source("none", || Ok(None)),
            source("first", || founded(1999)),
            source("second", || founded(2005)),
        ]);

        let (provider, facts) = registry.first_facts("Acme", None).await.expect("facts");
        assert_eq!(provider, "first");
        assert_eq!(facts.founded_year, Some(1999));
    }

    #[test]
    fn allowance_keeps_enabled_in_order() {
        let sources = vec![
            source("crunchbase", || Ok(None)),
            source("dnb", || Ok(None)),
        ];
        let config = ProvidersConfig {
            enabled: vec!["DnB".into()],
        };
        let registry = ProviderRegistry::allowed(sources, &config);
        assert_eq!(registry.names(), vec!["dnb"]);

        let none = ProviderRegistry::allowed(vec![source("dnb", || Ok(None))], &ProvidersConfig {
            enabled: vec![],
        });
        assert!(none.is_empty());
    }

    #[test]
    fn helpers() {
        assert_eq!(parse_year("Founded 14 March 1998"), Some(1998));
        assert_eq!(parse_year("recently"), None);
        assert_eq!(strip_tags("<b>Acme</b> GmbH"), "Acme GmbH");
        assert_eq!(non_empty("  ".into()), None);
    }
}
