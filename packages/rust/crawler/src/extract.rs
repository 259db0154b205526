//! Token extraction from raw page content: email addresses and social
//! network profile links.

use std::sync::LazyLock;

use regex::Regex;

use orgscout_shared::iunique;

// ---------------------------------------------------------------------------
// Emails
// ---------------------------------------------------------------------------

/// File extensions that look like TLDs in asset names (`logo@2x.png`).
const ASSET_SUFFIXES: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".css", ".js",
];

/// Pull email-like tokens out of raw text or HTML.
///
/// Common obfuscations (`&#64;`, `%40`, ` [at] `) are undone first. Results
/// are deduplicated ignoring case, in order of appearance.
pub fn extract_emails(text: &str) -> Vec<String> {
    static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").expect("valid regex")
    });

    let text = text
        .replace("&#64;", "@")
        .replace("&commat;", "@")
        .replace("%40", "@")
        .replace(" [at] ", "@")
        .replace("(at)", "@");

    iunique(
        EMAIL_RE
            .find_iter(&text)
            .map(|m| m.as_str().trim_matches('.'))
            .filter(|email| {
                let lowered = email.to_lowercase();
                !ASSET_SUFFIXES.iter().any(|suffix| lowered.ends_with(suffix))
            })
            .map(str::to_string),
    )
}

// ---------------------------------------------------------------------------
// Social links
// ---------------------------------------------------------------------------

/// Social networks a company profile link can point to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialNetwork {
    LinkedIn,
    Twitter,
    Facebook,
}

/// Path segments that are share widgets or navigation, not profiles.
const NON_PROFILE_PATHS: &[&str] = &[
    "share", "sharer", "sharer.php", "intent", "home", "login", "dialog", "plugins", "tr",
];

impl SocialNetwork {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LinkedIn => "linkedin",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
        }
    }

    fn pattern(&self) -> &'static Regex {
        static LINKEDIN_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)^https?://(?:[a-z]{2,3}\.)?linkedin\.com/company/([^/?#\s]+)")
                .expect("valid regex")
        });
        static TWITTER_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)^https?://(?:www\.|mobile\.)?(?:twitter|x)\.com/([A-Za-z0-9_]{1,15})/?(?:[?#].*)?$")
                .expect("valid regex")
        });
        static FACEBOOK_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"(?i)^https?://(?:www\.|m\.|[a-z]{2}-[a-z]{2}\.)?facebook\.com/([A-Za-z0-9.\-]+)")
                .expect("valid regex")
        });

        match self {
            Self::LinkedIn => &LINKEDIN_RE,
            Self::Twitter => &TWITTER_RE,
            Self::Facebook => &FACEBOOK_RE,
        }
    }

    /// Whether `link` is a profile URL on this network.
    pub fn matches(&self, link: &str) -> bool {
        self.pattern()
            .captures(link.trim())
            .and_then(|caps| caps.get(1))
            .is_some_and(|slug| !NON_PROFILE_PATHS.contains(&slug.as_str().to_lowercase().as_str()))
    }

    /// First profile link on this network quoted inside `html`
    /// (attribute values or inline JSON).
    pub fn find_in_html(&self, html: &str) -> Option<String> {
        static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"["'](https?:(?://|\\/\\/)[^"'\s<>]+)["']"#).expect("valid regex")
        });

        QUOTED_RE
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().replace("\\/", "/"))
            .find(|link| self.matches(link))
    }
}
