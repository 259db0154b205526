//! Company name variant generation.
//!
//! Variants are ordered from most to least specific. The matcher stops at the
//! first hit, so the coarse probes (acronyms, single tokens) come last.

use orgscout_shared::iunique;

/// Expand a company name into ordered, deduplicated match probes.
///
/// Tokens shorter than `min_partial_len` characters are dropped from the
/// "long words" variant (connectives, legal forms like "&" or "AG").
pub fn name_variants(name: &str, min_partial_len: usize) -> Vec<String> {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    let long_tokens: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| t.chars().count() >= min_partial_len)
        .collect();

    let mut variants = vec![
        tokens.join("-"),
        tokens.concat(),
        long_tokens.join("-"),
        long_tokens.concat(),
        long_tokens.join(" "),
    ];
    variants.extend(acronyms(&long_tokens));
    variants.extend(acronyms(&tokens));
    variants.extend(long_tokens.iter().map(|t| t.to_string()));

    iunique(variants)
}

/// Acronym of all tokens, acronyms of leading-token prefixes, then the
/// merged-lead forms.
///
/// For `M & GT Consulting Space` this yields `MGTCS`, `MGT`, `MGTC`, then
/// `MCS` and `MS`. Prefix forms cover domains that only abbreviate the
/// leading part; merged-lead forms treat the first `k` words as one word
/// and keep a single initial for them.
fn acronyms(tokens: &[&str]) -> Vec<String> {
    let parts: Vec<String> = tokens.iter().filter_map(|t| initials(t)).collect();
    let Some(lead) = parts.first().and_then(|p| p.chars().next()) else {
        return Vec::new();
    };

    let mut out = vec![parts.concat()];
    for len in 2..parts.len() {
        out.push(parts[..len].concat());
    }
    for merged in 2..parts.len() {
        out.push(format!("{lead}{}", parts[merged..].concat()));
    }
    out
}

/// What one token contributes to an acronym.
///
/// A token that is already a short upper-case abbreviation ("GT", "IBM")
/// contributes itself; anything else contributes its first letter or digit.
/// Pure punctuation ("&", "-") contributes nothing.
fn initials(token: &str) -> Option<String> {
    let alnum: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
    let first = alnum.chars().next()?;

    let is_abbreviation = alnum.chars().count() <= 3
        && alnum.chars().any(char::is_alphabetic)
        && alnum.chars().all(|c| !c.is_lowercase());
    if is_abbreviation {
        Some(alnum)
    } else {
        Some(first.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acronyms_cover_leading_abbreviation() {
        let variants = name_variants("M & GT Consulting Space", 4);
        assert!(variants.contains(&"MGT".to_string()));
        assert!(variants.contains(&"MGTC".to_string()));
        assert!(variants.contains(&"MGTCS".to_string()));
        assert!(variants.contains(&"CS".to_string()));
        assert!(variants.contains(&"MCS".to_string()));
        assert!(variants.contains(&"MS".to_string()));
    }

    #[test]
    fn variant_order_goes_from_specific_to_coarse() {
        let variants = name_variants("Acme Solutions AG", 4);
        assert_eq!(
            variants,
            vec![
                "Acme-Solutions-AG",
                "AcmeSolutionsAG",
                "Acme-Solutions",
                "AcmeSolutions",
                "Acme Solutions",
                "AS",
                "ASAG",
                "AAG",
                "Acme",
                "Solutions",
            ]
        );
    }

    #[test]
    fn no_empty_or_duplicate_variants() {
        for name in ["", "   ", "&", "A B", "Biedronka S.A.", "X  &  Y Z", "acme acme"] {
            let variants = name_variants(name, 4);
            assert!(variants.iter().all(|v| !v.is_empty()), "{name}: {variants:?}");
            let lowered: std::collections::HashSet<String> =
                variants.iter().map(|v| v.to_lowercase()).collect();
            assert_eq!(lowered.len(), variants.len(), "{name}: {variants:?}");
        }
    }

    #[test]
    fn lowercase_short_words_are_not_abbreviations() {
        assert_eq!(initials("of"), Some("o".into()));
        assert_eq!(initials("GT"), Some("GT".into()));
        assert_eq!(initials("S.A."), Some("SA".into()));
        assert_eq!(initials("&"), None);
        assert_eq!(initials("Consulting"), Some("C".into()));
    }
}
