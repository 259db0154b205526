//! Email discovery through search engines.
//!
//! Each query suffix gets a fresh [`EngineCursor`](orgscout_search::EngineCursor),
//! so no engine position survives between suffixes or calls. The paid
//! channel runs once, only when every free path came back empty.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{error, info, instrument, warn};

use orgscout_matching::filter_job_application;
use orgscout_search::{PaidSearch, SearchEngines};
use orgscout_shared::{EmailBatch, EmailSource, Result};

use crate::result_extractor::SearchResultEmailExtractor;
use crate::suffixes::{EMAIL_SUFFIX, query_suffixes};

/// Strip the parts of a location string that make searches worse: dash
/// separated tails, parenthesized notes and leading postal codes.
pub fn clean_location(location: &str) -> String {
    static CLEANUP: LazyLock<Vec<Regex>> = LazyLock::new(|| {
        [r"(?mi) [-–] .*", r"(?mi) [-–]", r"(?mi)\(.*", r"(?mi)^[0-9]* "]
            .iter()
            .map(|pattern| Regex::new(pattern).expect("valid regex"))
            .collect()
    });

    CLEANUP
        .iter()
        .fold(location.to_string(), |cleaned, re| {
            re.replace_all(cleaned.trim(), "").into_owned()
        })
        .trim()
        .to_string()
}

pub struct EmailDiscovery {
    engines: SearchEngines,
    paid: Option<Arc<dyn PaidSearch>>,
    results: SearchResultEmailExtractor,
}

impl EmailDiscovery {
    pub fn new(
        engines: SearchEngines,
        paid: Option<Arc<dyn PaidSearch>>,
        results: SearchResultEmailExtractor,
    ) -> Self {
        Self {
            engines,
            paid,
            results,
        }
    }

    /// Find job-application emails for a company. `None` means nothing
    /// usable was found, which is a normal outcome.
    #[instrument(skip_all, fields(company = %company_name))]
    pub async fn discover_emails(
        &self,
        company_name: &str,
        location: Option<&str>,
        locale: Option<&str>,
    ) -> Result<Option<EmailBatch>> {
        info!("trying to obtain emails from website");
        let location = location.map(clean_location).filter(|l| !l.is_empty());

        let mut batch = self
            .search_suffix_by_suffix(company_name, location.as_deref(), locale)
            .await?;
        if !batch.has_emails() {
            batch = self.search_paid(company_name, locale).await?;
            batch.via_paid_search = true;
        }

        batch.job_application_emails = filter_job_application(&batch.emails);
        if batch.job_application_emails.is_empty() {
            info!(emails = ?batch.emails, "none of the emails can be used for job applications");
            return Ok(None);
        }

        info!(
            count = batch.job_application_emails.len(),
            via_paid_search = batch.via_paid_search,
            "found emails suitable for job applications"
        );
        batch.source = Some(EmailSource::Website);
        Ok(Some(batch))
    }

    async fn search_suffix_by_suffix(
        &self,
        company_name: &str,
        location: Option<&str>,
        locale: Option<&str>,
    ) -> Result<EmailBatch> {
        let mut batch = EmailBatch::default();

        for suffix in query_suffixes(locale) {
            if batch.has_emails() {
                info!("found emails, not searching any more");
                break;
            }

            let query = match location {
                Some(location) => format!("{company_name} {location} {suffix}"),
                None => format!("{company_name} {suffix}"),
            };

            let mut cursor = self.engines.cursor();
            while !batch.has_emails() && cursor.advance() {
                let engine = cursor.current_name().unwrap_or_default().to_string();
                info!(%query, %engine, "searching for website");

                let outcome = match cursor.query(&query).await {
                    Ok(hits) => self.results.handle(&hits, &mut batch, company_name).await,
                    Err(e) => Err(e),
                };

                if let Err(e) = outcome {
                    warn!(%query, %engine, error = %e, "search failed, trying next suffix");
                    break;
                }
            }
        }

        Ok(batch)
    }

    async fn search_paid(&self, company_name: &str, locale: Option<&str>) -> Result<EmailBatch> {
        let mut batch = EmailBatch::default();
        let Some(paid) = &self.paid else {
            info!("no paid search channel configured");
            return Ok(batch);
        };

        let query = format!("{company_name} {EMAIL_SUFFIX}");
        info!(%query, "falling back to paid search");
        let hits = match paid.query(&query, locale).await {
            Ok(hits) => self.engines.drop_excluded(hits),
            Err(e) => {
                error!(%query, error = %e, "paid search failed");
                return Ok(batch);
            }
        };

        self.results.handle(&hits, &mut batch, company_name).await?;
        Ok(batch)
    }
}
