//! Page fetch engine.
//!
//! [`PageFetcher`] is the seam the pipeline talks to; [`HttpFetcher`] is the
//! reqwest-backed implementation. Failures are classified so callers can
//! tell "the site is unreachable right now" apart from real errors.

use std::error::Error as _;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderName, USER_AGENT};
use reqwest::{Client, Proxy};
use tracing::{debug, warn};
use url::Url;

use orgscout_shared::{FetchConfig, OrgScoutError};

// ---------------------------------------------------------------------------
// FetchError
// ---------------------------------------------------------------------------

/// Why a page could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("could not resolve host for {url}")]
    DnsResolution { url: String },

    #[error("connection timed out for {url}")]
    Timeout { url: String },

    /// The response carried no parseable document (download, empty body).
    #[error("empty document at {url}")]
    EmptyDocument { url: String },

    /// The link points at a loopback/private address or a non-HTTP scheme.
    #[error("refusing to fetch {url}")]
    Blocked { url: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    /// Failures that mean "no data from this link" rather than a fault.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DnsResolution { .. }
                | Self::Timeout { .. }
                | Self::EmptyDocument { .. }
                | Self::Blocked { .. }
        )
    }

    /// HTTP status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<FetchError> for OrgScoutError {
    fn from(err: FetchError) -> Self {
        OrgScoutError::Network(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

/// Per-request knobs.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Overrides the client's default user agent.
    pub user_agent: Option<String>,
    /// Route the request through the configured proxy, if any.
    pub with_proxy: bool,
}

impl FetchOptions {
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: Some(user_agent.into()),
            with_proxy: false,
        }
    }

    pub fn proxied() -> Self {
        Self {
            user_agent: None,
            with_proxy: true,
        }
    }
}

/// Fetches the HTML (or other text body) behind a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String, FetchError>;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// reqwest-backed fetcher with an optional proxied client.
pub struct HttpFetcher {
    client: Client,
    proxy_client: Option<Client>,
    /// Allow localhost/private IPs (for tests against mock servers).
    allow_localhost: bool,
}

impl HttpFetcher {
    /// Build clients from the `[fetch]` config section.
    pub fn new(config: &FetchConfig) -> Result<Self, OrgScoutError> {
        let client = build_client(config, None)?;
        let proxy_client = config
            .proxy
            .as_deref()
            .map(|proxy| build_client(config, Some(proxy)))
            .transpose()?;

        Ok(Self {
            client,
            proxy_client,
            allow_localhost: false,
        })
    }

    /// Allow fetching localhost/private IPs. Only meant for local mock servers.
    pub fn allow_localhost(mut self) -> Self {
        self.allow_localhost = true;
        self
    }
}

fn build_client(config: &FetchConfig, proxy: Option<&str>) -> Result<Client, OrgScoutError> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(config.timeout_secs));

    if let Some(proxy) = proxy {
        let proxy = Proxy::all(proxy)
            .map_err(|e| OrgScoutError::config(format!("invalid proxy '{proxy}': {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| OrgScoutError::Network(format!("failed to build HTTP client: {e}")))
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if !self.allow_localhost && is_ssrf_target(&parsed) {
            warn!(url, "SSRF protection: blocked");
            return Err(FetchError::Blocked {
                url: url.to_string(),
            });
        }

        let client = match (&self.proxy_client, options.with_proxy) {
            (Some(proxied), true) => proxied,
            _ => &self.client,
        };

        let mut request = client.get(parsed.as_str());
        if let Some(user_agent) = &options.user_agent {
            request = request.header(USER_AGENT, user_agent.as_str());
        }

        debug!(url, with_proxy = options.with_proxy, "fetching page");
        let response = request.send().await.map_err(|e| classify(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if is_download(response.headers()) {
            return Err(FetchError::EmptyDocument {
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| classify(url, &e))?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyDocument {
                url: url.to_string(),
            });
        }

        Ok(body)
    }
}

/// Responses that are files rather than documents.
fn is_download(headers: &HeaderMap) -> bool {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_lowercase)
    };

    if header(CONTENT_DISPOSITION).is_some_and(|v| v.starts_with("attachment")) {
        return true;
    }

    header(CONTENT_TYPE).is_some_and(|v| {
        !(v.contains("html") || v.contains("text") || v.contains("xml") || v.contains("json"))
    })
}

/// Map a reqwest error onto the fetch taxonomy.
fn classify(url: &str, err: &reqwest::Error) -> FetchError {
    let url = url.to_string();
    if err.is_timeout() {
        return FetchError::Timeout { url };
    }

    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    let lowered = chain.to_lowercase();

    if lowered.contains("dns error")
        || lowered.contains("failed to lookup address")
        || lowered.contains("name or service not known")
        || lowered.contains("no such host")
    {
        FetchError::DnsResolution { url }
    } else if lowered.contains("timed out") {
        FetchError::Timeout { url }
    } else {
        FetchError::Request {
            url,
            message: chain,
        }
    }
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
fn is_ssrf_target(url: &Url) -> bool {
    // Block non-HTTP schemes
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    if let Some(host) = url.host_str() {
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return is_private_ip(&ip);
        }
        if host == "localhost" || host.ends_with(".local") || host.ends_with(".internal") {
            return true;
        }
    }

    false
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> HttpFetcher {
        let config = FetchConfig {
            timeout_secs: 2,
            ..FetchConfig::default()
        };
        HttpFetcher::new(&config).expect("client").allow_localhost()
    }

    #[test]
    fn transient_classification() {
        let url = "http://acme.de".to_string();
        assert!(FetchError::DnsResolution { url: url.clone() }.is_transient());
        assert!(FetchError::Timeout { url: url.clone() }.is_transient());
        assert!(FetchError::EmptyDocument { url: url.clone() }.is_transient());
        assert!(!FetchError::Status { url: url.clone(), status: 500 }.is_transient());
        assert!(
            !FetchError::Request {
                url,
                message: "connection refused".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn ssrf_protection() {
        assert!(is_ssrf_target(&Url::parse("file:///etc/passwd").expect("url")));
        assert!(is_ssrf_target(&Url::parse("http://192.168.1.1/admin").expect("url")));
        assert!(is_ssrf_target(&Url::parse("http://127.0.0.1:8080/").expect("url")));
        assert!(is_ssrf_target(&Url::parse("http://localhost:3000/").expect("url")));
        assert!(is_ssrf_target(&Url::parse("http://[::1]/").expect("url")));
        assert!(!is_ssrf_target(&Url::parse("https://acme.de/kontakt").expect("url")));
    }

    #[test]
    fn invalid_proxy_is_a_config_error() {
        let config = FetchConfig {
            proxy: Some("not a proxy url".into()),
            ..FetchConfig::default()
        };
        assert!(matches!(
            HttpFetcher::new(&config),
            Err(OrgScoutError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn fetches_html_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kontakt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string("<html><body>hr@acme.de</body></html>"),
            )
            .mount(&server)
            .await;

        let body = test_fetcher()
            .fetch(&format!("{}/kontakt", server.uri()), &FetchOptions::default())
            .await
            .expect("fetch");
        assert!(body.contains("hr@acme.de"));
    }

    #[tokio::test]
    async fn custom_user_agent_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "orgscout-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
            .mount(&server)
            .await;

        let body = test_fetcher()
            .fetch(
                &server.uri(),
                &FetchOptions::with_user_agent("orgscout-test/1.0"),
            )
            .await
            .expect("fetch");
        assert_eq!(body, "<p>ok</p>");
    }

    #[tokio::test]
    async fn http_errors_are_not_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = test_fetcher()
            .fetch(&server.uri(), &FetchOptions::default())
            .await
            .expect_err("503");
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn downloads_and_blank_pages_are_empty_documents() {
        let server = MockServer::start().await;
        Mock::given(path("/report.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"%PDF-1.4".to_vec()),
            )
            .mount(&server)
            .await;
        Mock::given(path("/blank"))
            .respond_with(ResponseTemplate::new(200).set_body_string("   \n"))
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        for page in ["/report.pdf", "/blank"] {
            let err = fetcher
                .fetch(&format!("{}{page}", server.uri()), &FetchOptions::default())
                .await
                .expect_err("empty document");
            assert!(matches!(err, FetchError::EmptyDocument { .. }), "{page}: {err}");
        }
    }

    #[tokio::test]
    async fn private_hosts_are_blocked_by_default() {
        let fetcher = HttpFetcher::new(&FetchConfig::default()).expect("client");
        let err = fetcher
            .fetch("http://127.0.0.1:9/", &FetchOptions::default())
            .await
            .expect_err("blocked");
        assert!(matches!(err, FetchError::Blocked { .. }));
        assert!(err.is_transient());
    }
}
