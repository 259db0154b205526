//! Query vocabulary appended to the company name when searching for
//! contact pages.

use orgscout_shared::iunique;

/// Suffix used for the single paid fallback query.
pub const EMAIL_SUFFIX: &str = "email";

const TOP_PRIORITY: &[&str] = &["email +@", "email"];

const LOWER_PRIORITY: &[&str] = &["contact", "impressum", "about"];

/// Locale-specific vocabulary keyed by three-letter country code.
const LOCALE_SUFFIXES: &[(&str, &[&str])] = &[
    ("DEU", &["kontakt", "unternehmen", "karriere"]),
    ("POL", &["kontakt", "o nas", "kariera", "praca"]),
    ("FRA", &["carrière", "entreprise"]),
    ("ESP", &["contacto", "carrera"]),
    ("SWE", &["karriär", "kontakt"]),
    ("NOR", &["karriere", "kontakt"]),
];

fn locale_suffixes(locale: Option<&str>) -> Option<&'static [&'static str]> {
    let locale = locale?.trim().to_ascii_uppercase();
    LOCALE_SUFFIXES
        .iter()
        .find(|(code, _)| *code == locale)
        .map(|(_, suffixes)| *suffixes)
}

/// Ordered, deduplicated suffixes to try for `locale`: the generic top
/// pair, the locale set (or every generic suffix when the locale is
/// unknown), then the generic tail.
pub fn query_suffixes(locale: Option<&str>) -> Vec<String> {
    let middle = locale_suffixes(locale)
        .map(|s| s.to_vec())
        .unwrap_or_else(|| TOP_PRIORITY.iter().chain(LOWER_PRIORITY).copied().collect());

    iunique(
        TOP_PRIORITY
            .iter()
            .chain(middle.iter())
            .chain(LOWER_PRIORITY)
            .copied(),
    )
}
