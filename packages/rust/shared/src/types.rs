//! Core domain types for company enrichment.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::urls::host_of;

// ---------------------------------------------------------------------------
// Case-insensitive set helpers
// ---------------------------------------------------------------------------

/// Deduplicate strings case-insensitively, keeping the first-seen spelling
/// and order. Empty strings are dropped.
pub fn iunique<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out = Vec::new();
    extend_iunique(&mut out, items);
    out
}

/// Append `items` to `target`, skipping entries already present (ignoring case).
pub fn extend_iunique<I, S>(target: &mut Vec<String>, items: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen: HashSet<String> = target.iter().map(|s| s.to_lowercase()).collect();
    for item in items {
        let item = item.into();
        if item.is_empty() {
            continue;
        }
        if seen.insert(item.to_lowercase()) {
            target.push(item);
        }
    }
}

// ---------------------------------------------------------------------------
// SearchHit
// ---------------------------------------------------------------------------

/// One search-engine result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result link as the engine reported it (may lack a scheme).
    pub link: String,
    /// Snippet text shown under the link.
    #[serde(default)]
    pub description: String,
}

impl SearchHit {
    pub fn new(link: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CachedSite
// ---------------------------------------------------------------------------

/// A single cached page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPage {
    pub url: String,
    pub content: String,
}

/// Fetched pages for one host, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSite {
    /// Host the pages belong to (cache key).
    pub host: String,
    /// Pages keyed by the exact URL they were stored under.
    #[serde(default)]
    pub pages: Vec<CachedPage>,
}

impl CachedSite {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            pages: Vec::new(),
        }
    }

    /// Whether content is cached for exactly this URL.
    pub fn has_exact_url(&self, url: &str) -> bool {
        self.pages.iter().any(|p| p.url == url)
    }

    /// Cached content for exactly this URL.
    pub fn content_for_url(&self, url: &str) -> Option<&str> {
        self.pages
            .iter()
            .find(|p| p.url == url)
            .map(|p| p.content.as_str())
    }

    /// Content of the first page stored for this host.
    pub fn first_content(&self) -> Option<&str> {
        self.pages.first().map(|p| p.content.as_str())
    }

    /// Add a page. Returns `false` (and changes nothing) when the URL is
    /// already present.
    pub fn add_page(&mut self, url: impl Into<String>, content: impl Into<String>) -> bool {
        let url = url.into();
        if self.has_exact_url(&url) {
            return false;
        }
        self.pages.push(CachedPage {
            url,
            content: content.into(),
        });
        true
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

// ---------------------------------------------------------------------------
// EmailBatch
// ---------------------------------------------------------------------------

/// Where the emails of a batch were read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailSource {
    /// Pages of the company's own website.
    Website,
}

/// Output of the email-discovery stage.
///
/// Accumulates across search-engine queries within one discovery run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailBatch {
    /// Emails from the last productive extraction.
    pub emails: Vec<String>,
    /// Subset of `emails` that passed the job-application filter.
    pub job_application_emails: Vec<String>,
    /// Link of the page that yielded the job-application emails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EmailSource>,
    /// The pages were found through the metered search channel.
    #[serde(default)]
    pub via_paid_search: bool,
    /// Links already searched during this run.
    #[serde(skip)]
    crawled: HashSet<String>,
}

impl EmailBatch {
    pub fn has_emails(&self) -> bool {
        !self.emails.is_empty()
    }

    pub fn used_website_host(&self) -> Option<String> {
        self.used_website_url.as_deref().and_then(host_of)
    }

    pub fn is_crawled(&self, link: &str) -> bool {
        self.crawled.contains(link)
    }

    pub fn mark_crawled(&mut self, link: impl Into<String>) {
        self.crawled.insert(link.into());
    }
}

// ---------------------------------------------------------------------------
// Organization facts
// ---------------------------------------------------------------------------

/// Social network profile links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
}

/// One organization-data provider's view of a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationFacts {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<u16>,
    #[serde(default)]
    pub industries: Vec<String>,
    /// Free-form headcount text as the provider shows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub social: SocialLinks,
}

impl OrganizationFacts {
    /// True when the provider found nothing worth merging.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// ---------------------------------------------------------------------------
// CompanyRecord
// ---------------------------------------------------------------------------

/// Aggregated enrichment output for one company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Three-letter country code used to pick query vocabulary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub job_application_emails: Vec<String>,
    #[serde(default)]
    pub social: SocialLinks,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employees: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CompanyRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location.filter(|l| !l.trim().is_empty());
        self
    }

    pub fn with_locale(mut self, locale: Option<String>) -> Self {
        self.locale = locale.filter(|l| !l.trim().is_empty());
        self
    }

    /// Set the website unless one is already known. Returns whether it was set.
    pub fn set_website_if_empty(&mut self, website: impl Into<String>) -> bool {
        let website = website.into();
        if website.is_empty() || self.website.as_deref().is_some_and(|w| !w.is_empty()) {
            return false;
        }
        self.website = Some(website);
        true
    }

    pub fn add_emails<I, S>(&mut self, emails: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_iunique(&mut self.emails, emails);
    }

    pub fn add_job_application_emails<I, S>(&mut self, emails: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_iunique(&mut self.job_application_emails, emails);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iunique_keeps_first_spelling() {
        let out = iunique(["HR@acme.de", "hr@acme.de", "", "info@acme.de", "Info@Acme.de"]);
        assert_eq!(out, vec!["HR@acme.de", "info@acme.de"]);
    }

    #[test]
    fn cached_site_is_first_write_wins() {
        let mut site = CachedSite::new("acme.de");
        assert!(site.add_page("https://acme.de/kontakt", "<p>a</p>"));
        assert!(!site.add_page("https://acme.de/kontakt", "<p>b</p>"));
        assert_eq!(site.len(), 1);
        assert_eq!(site.content_for_url("https://acme.de/kontakt"), Some("<p>a</p>"));
        assert!(site.content_for_url("https://acme.de/").is_none());
    }

    #[test]
    fn cached_site_first_content_follows_insertion_order() {
        let mut site = CachedSite::new("acme.de");
        site.add_page("https://acme.de/b", "b");
        site.add_page("https://acme.de/a", "a");
        assert_eq!(site.first_content(), Some("b"));
    }

    #[test]
    fn website_is_set_only_once() {
        let mut record = CompanyRecord::new("Acme");
        assert!(record.set_website_if_empty("acme.de"));
        assert!(!record.set_website_if_empty("acme-holding.com"));
        assert_eq!(record.website.as_deref(), Some("acme.de"));
    }

    #[test]
    fn email_sets_are_case_insensitive() {
        let mut record = CompanyRecord::new("Acme");
        record.add_job_application_emails(["jobs@acme.de"]);
        record.add_job_application_emails(["JOBS@acme.de", "hr@acme.de"]);
        assert_eq!(record.job_application_emails, vec!["jobs@acme.de", "hr@acme.de"]);
    }

    #[test]
    fn empty_facts_detected() {
        assert!(OrganizationFacts::default().is_empty());
        let facts = OrganizationFacts {
            founded_year: Some(1999),
            ..Default::default()
        };
        assert!(!facts.is_empty());
    }

    #[test]
    fn batch_serialization_skips_crawl_state() {
        let mut batch = EmailBatch::default();
        batch.mark_crawled("https://acme.de");
        batch.emails.push("hr@acme.de".into());
        batch.source = Some(EmailSource::Website);
        batch.via_paid_search = true;
        batch.used_website_url = Some("https://www.acme.de/kontakt".into());
        assert_eq!(batch.used_website_host().as_deref(), Some("www.acme.de"));

        let json = serde_json::to_string(&batch).expect("serialize");
        assert!(json.contains(r#""source":"website""#));
        assert!(json.contains(r#""via_paid_search":true"#));
        assert!(!json.contains("crawled"));
    }
}
