//! URL helpers for links as search engines report them.
//!
//! Search results often come without a scheme (`acme.de/kontakt`), so the
//! helpers here are lenient where [`url::Url`] is strict.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Prefix `http://` unless the link already starts with `http`.
pub fn with_scheme(link: &str) -> String {
    if link.starts_with("http") {
        link.to_string()
    } else {
        format!("http://{link}")
    }
}

/// Extract the host of a link.
///
/// Links with a scheme are parsed normally. A scheme-less link is accepted
/// only when it is a bare host (`acme.de`); `acme.de/jobs` has no
/// recognizable host and yields `None`.
pub fn host_of(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    if link.contains("://") {
        return Url::parse(link)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
            .filter(|h| !h.is_empty());
    }

    let is_bare_host = !link.contains(['/', '?', '#', ' ', '@']) && link.contains('.');
    is_bare_host.then(|| link.to_lowercase())
}

/// Whether a link is a fully qualified URL with a host.
pub fn is_valid_url(link: &str) -> bool {
    Url::parse(link)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// The registrable name of a host with subdomain and TLD removed,
/// e.g. `jobs.acme-solutions.co.uk` -> `acme-solutions`.
pub fn domain_label(link: &str) -> Option<String> {
    static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)(www\.)?(?P<subdomain>[a-z0-9][a-z0-9\-]{1,63}\.)?(?P<domain>[a-z0-9][a-z0-9\-]{1,63})\.[a-z\.]{2,6}",
        )
        .expect("valid regex")
    });

    let subject = Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| link.to_string());

    DOMAIN_RE
        .captures(&subject)
        .and_then(|caps| caps.name("domain"))
        .map(|m| m.as_str().to_string())
}

/// Host and query string of a link after scheme normalization. Two links
/// with the same key point at the same resource.
pub fn canonical_key(link: &str) -> Option<(String, Option<String>)> {
    let url = Url::parse(&with_scheme(link)).ok()?;
    let host = url.host_str()?.to_lowercase();
    Some((host, url.query().map(str::to_string)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_prepended_once() {
        assert_eq!(with_scheme("acme.de"), "http://acme.de");
        assert_eq!(with_scheme("https://acme.de"), "https://acme.de");
    }

    #[test]
    fn host_extraction() {
        assert_eq!(host_of("https://WWW.Acme.de/jobs").as_deref(), Some("www.acme.de"));
        assert_eq!(host_of("acme-solutions.de").as_deref(), Some("acme-solutions.de"));
        assert_eq!(host_of("acme.de/jobs"), None);
        assert_eq!(host_of("mailto:hr@acme.de"), None);
        assert_eq!(host_of(""), None);
        assert_eq!(host_of("not a link"), None);
    }

    #[test]
    fn url_validity() {
        assert!(is_valid_url("https://acme.de/a?q=1"));
        assert!(!is_valid_url("acme.de/a?q=1"));
        assert!(!is_valid_url("javascript:void(0)"));
    }

    #[test]
    fn domain_label_strips_subdomain_and_tld() {
        assert_eq!(domain_label("https://www.acme.de/kontakt").as_deref(), Some("acme"));
        assert_eq!(
            domain_label("jobs.acme-solutions.co.uk").as_deref(),
            Some("acme-solutions")
        );
        assert_eq!(domain_label("localhost"), None);
    }

    #[test]
    fn canonical_key_ignores_scheme_and_path() {
        assert_eq!(
            canonical_key("example.com/a?q=1"),
            canonical_key("https://example.com/a?q=1")
        );
        assert_ne!(
            canonical_key("https://example.com/a?q=1"),
            canonical_key("https://example.com/a?q=2")
        );
    }
}
