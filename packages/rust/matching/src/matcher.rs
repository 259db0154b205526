//! Relevance matching between arbitrary strings and a company name.

use orgscout_shared::MatchingConfig;
use tracing::trace;

use crate::similarity::similarity_percent;
use crate::variants::name_variants;

/// Fuzzy "is this about the company" decisions.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    threshold: f64,
    min_partial_len: usize,
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self::from(&MatchingConfig::default())
    }
}

impl From<&MatchingConfig> for NameMatcher {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            threshold: config.similarity_threshold,
            min_partial_len: config.min_partial_len,
        }
    }
}

impl NameMatcher {
    /// Match probes for a company name, most specific first.
    pub fn variants(&self, company_name: &str) -> Vec<String> {
        name_variants(company_name, self.min_partial_len)
    }

    /// Whether `candidate` (a domain label, mailbox name, title...) is
    /// similar enough to any variant of the company name.
    pub fn is_related(&self, candidate: &str, company_name: &str) -> bool {
        let candidate = candidate.to_lowercase();
        if candidate.is_empty() {
            return false;
        }

        self.variants(company_name).into_iter().any(|variant| {
            let score = similarity_percent(&variant.to_lowercase(), &candidate);
            if score >= self.threshold {
                trace!(%variant, %candidate, score, "relevance match");
                true
            } else {
                false
            }
        })
    }

    /// See [`contains_company_name`].
    pub fn contains_company_name(&self, text: &str, company_name: &str) -> bool {
        contains_company_name(text, company_name)
    }
}

/// Cheap substring check: the text mentions the full company name or its
/// first word, ignoring case.
pub fn contains_company_name(text: &str, company_name: &str) -> bool {
    let text = text.to_lowercase();
    let name = company_name.trim().to_lowercase();
    let Some(first_word) = name.split_whitespace().next() else {
        return false;
    };

    text.contains(&name) || text.contains(first_word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn related_to_own_brand() {
        let matcher = NameMatcher::default();
        assert!(matcher.is_related("biedronka", "Biedronka S.A."));
        assert!(matcher.is_related("acme-solutions", "Acme Solutions GmbH"));
        assert!(matcher.is_related("ACMESOLUTIONS", "Acme Solutions GmbH"));
    }

    #[test]
    fn unrelated_strings_do_not_match() {
        let matcher = NameMatcher::default();
        assert!(!matcher.is_related("unrelatedcorp", "Biedronka S.A."));
        assert!(!matcher.is_related("", "Biedronka S.A."));
        assert!(!matcher.is_related("gmail", "Acme Solutions GmbH"));
    }

    #[test]
    fn threshold_comes_from_config() {
        let strict = NameMatcher::from(&MatchingConfig {
            similarity_threshold: 100.0,
            min_partial_len: 4,
        });
        assert!(!strict.is_related("biedronka-sa", "Biedronka S.A."));
        assert!(strict.is_related("biedronka-s.a.", "Biedronka S.A."));
    }

    #[test]
    fn contains_name_or_first_word() {
        assert!(contains_company_name(
            "Kontakt - ACME Solutions GmbH in Berlin",
            "Acme Solutions GmbH"
        ));
        assert!(contains_company_name("acme.de - Impressum", "Acme Solutions GmbH"));
        assert!(!contains_company_name("Some other firm", "Acme Solutions GmbH"));
        assert!(!contains_company_name("anything", "   "));
    }
}
