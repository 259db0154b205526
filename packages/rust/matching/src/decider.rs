//! Email decisions: which addresses belong to the company, which are usable
//! for job applications, and which of those to prefer.

use orgscout_shared::iunique;

use crate::matcher::NameMatcher;
use crate::wordlists::{EXCLUDED, PREFERRED, flatten};

/// Split an address into `(mailbox, domain)`. The mailbox is everything
/// before the first `@`, the domain everything after the last one.
fn split_address(email: &str) -> (&str, &str) {
    let mailbox = email.split('@').next().unwrap_or_default();
    let domain = email.rsplit('@').next().unwrap_or_default();
    (mailbox, domain)
}

/// Filters candidate addresses against a company name.
#[derive(Debug, Clone, Default)]
pub struct EmailDecider {
    matcher: NameMatcher,
}

impl EmailDecider {
    pub fn new(matcher: NameMatcher) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &NameMatcher {
        &self.matcher
    }

    /// Whether the domain label (`acme` in `hr@acme.co.uk`) or the mailbox
    /// name matches the company.
    pub fn is_related(&self, email: &str, company_name: &str) -> bool {
        let (mailbox, domain) = split_address(email);
        let domain_label = domain.split('.').next().unwrap_or_default();

        self.matcher.is_related(domain_label, company_name)
            || self.matcher.is_related(mailbox, company_name)
    }

    /// Keep addresses related to the company, deduplicated ignoring case.
    pub fn filter_related<S: AsRef<str>>(&self, emails: &[S], company_name: &str) -> Vec<String> {
        iunique(
            emails
                .iter()
                .map(AsRef::as_ref)
                .filter(|email| self.is_related(email, company_name)),
        )
    }
}

/// Drop addresses whose mailbox contains an excluded word (privacy, press,
/// support...). The domain is not inspected.
pub fn filter_job_application<S: AsRef<str>>(emails: &[S]) -> Vec<String> {
    iunique(emails.iter().map(AsRef::as_ref).filter(|email| {
        let mailbox = split_address(email).0.to_lowercase();
        !flatten(EXCLUDED).any(|word| mailbox.contains(word))
    }))
}

/// Preference rank of an address: position of the first preferred word its
/// mailbox contains, or `None` when no preferred word matches.
fn preference_rank(email: &str) -> Option<usize> {
    let mailbox = split_address(email).0.to_lowercase();
    flatten(PREFERRED).position(|word| mailbox.contains(word))
}

/// Order addresses by preference. Unranked addresses keep their relative
/// order after all ranked ones.
pub fn rank_preferred<S: AsRef<str>>(emails: &[S]) -> Vec<String> {
    let mut ranked: Vec<(Option<usize>, String)> = iunique(emails.iter().map(AsRef::as_ref))
        .into_iter()
        .map(|email| (preference_rank(&email), email))
        .collect();
    ranked.sort_by_key(|(rank, _)| rank.unwrap_or(usize::MAX));
    ranked.into_iter().map(|(_, email)| email).collect()
}
