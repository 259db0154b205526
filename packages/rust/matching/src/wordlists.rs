//! Mailbox-name wordlists, grouped by language or category.
//!
//! Group order matters for [`PREFERRED`]: earlier groups rank higher.

/// Mailbox names that usually reach a human who handles applications.
pub const PREFERRED: &[(&str, &[&str])] = &[
    (
        "general",
        &[
            "hello", "hallo", "job", "jobs", "hr", "contact", "info", "office", "website", "mail",
        ],
    ),
    ("eng", &["post", "work", "hi", "welcome"]),
    ("de", &["moin", "arbeit"]),
    ("pl", &["kontakt", "praca", "zatrudnienie", "biuro", "kadry"]),
    ("esp", &["contactenos", "recrutement"]),
];

/// Substrings that disqualify a mailbox from job-application use.
pub const EXCLUDED: &[(&str, &[&str])] = &[
    (
        "general",
        &[
            "data protection",
            "dataprotection",
            "data security",
            "datasecurity",
            "training",
            "advice",
            "webmaster",
            "press",
            "pressoffice",
            "assistance",
            "accommodations",
            "security",
            "responsibility",
            "privacy",
            "dpo",
            "media",
            "client",
        ],
    ),
    ("pol", &["faktura", "recepcja", "prasa"]),
    (
        "eng",
        &[
            "fan", "team", "shop", "support", "service", "feedback", "sales", "help", "admin",
            "recharge", "answers", "invest",
        ],
    ),
    (
        "de",
        &["impressum", "frage", "abmeld", "presse", "patent", "datenschutz"],
    ),
    (
        "esp",
        &["controlciudadano", "judiciales", "servicio", "autorizacion"],
    ),
    (
        "fra",
        &[
            "partenaire",
            "allocataires",
            "reductions",
            "recouvrement",
            "contentieux",
            "affiliations",
            "comptabilite",
            "entrepreneur",
            "actionnaires",
        ],
    ),
];

/// All words of a grouped list, flattened in priority order.
pub fn flatten(
    groups: &'static [(&'static str, &'static [&'static str])],
) -> impl Iterator<Item = &'static str> {
    groups.iter().flat_map(|(_, words)| words.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_and_excluded_do_not_overlap() {
        for preferred in flatten(PREFERRED) {
            assert!(
                flatten(EXCLUDED).all(|excluded| !preferred.contains(excluded)),
                "{preferred} would be excluded"
            );
        }
    }

    #[test]
    fn words_are_lowercase() {
        assert!(flatten(PREFERRED).chain(flatten(EXCLUDED)).all(|w| w == w.to_lowercase()));
    }
}
