//! SerpAPI: the metered Google results channel.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use orgscout_shared::{FetchConfig, OrgScoutError, Result, SearchHit};

use crate::PaidSearch;

/// Google country (`gl`) for a three-letter locale code.
pub fn country_code(locale: &str) -> Option<&'static str> {
    match locale.to_ascii_uppercase().as_str() {
        "DEU" => Some("de"),
        "POL" => Some("pl"),
        "FRA" => Some("fr"),
        "ESP" => Some("es"),
        "SWE" => Some("se"),
        "NOR" => Some("no"),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: Option<String>,
    #[serde(default)]
    snippet: String,
}

pub struct SerpApiSearch {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SerpApiSearch {
    pub fn new(api_key: impl Into<String>, config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OrgScoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: "https://serpapi.com".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PaidSearch for SerpApiSearch {
    #[instrument(skip_all, fields(provider = "serpapi", query = %query))]
    async fn query(&self, query: &str, locale: Option<&str>) -> Result<Vec<SearchHit>> {
        let mut params = vec![
            ("engine", "google"),
            ("q", query),
            ("num", "20"),
            ("api_key", self.api_key.as_str()),
        ];
        if let Some(gl) = locale.and_then(country_code) {
            params.push(("gl", gl));
        }

        let url = format!("{}/search.json", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| OrgScoutError::provider("serpapi", e.to_string()))?;

        let status = response.status();
        let body: SerpResponse = response
            .json()
            .await
            .map_err(|e| OrgScoutError::parse(format!("serpapi response: {e}")))?;

        if let Some(error) = body.error {
            return Err(OrgScoutError::provider("serpapi", error));
        }
        if !status.is_success() {
            return Err(OrgScoutError::provider("serpapi", format!("HTTP {status}")));
        }

        let hits: Vec<SearchHit> = body
            .organic_results
            .into_iter()
            .filter_map(|result| Some(SearchHit::new(result.link?, result.snippet)))
            .collect();
        debug!(hits = hits.len(), "serpapi results");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn maps_known_locales() {
        assert_eq!(country_code("DEU"), Some("de"));
        assert_eq!(country_code("swe"), Some("se"));
        assert_eq!(country_code("USA"), None);
    }

    #[tokio::test]
    async fn queries_with_country_and_reads_organic_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "Acme Solutions GmbH email"))
            .and(query_param("gl", "de"))
            .and(query_param("api_key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "organic_results": [
                    {"link": "https://acme-solutions.de/kontakt", "snippet": "jobs@acme-solutions.de"},
                    {"title": "no link"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let search = SerpApiSearch::new("secret", &FetchConfig::default())
            .expect("client")
            .with_base_url(server.uri());
        let hits = search
            .query("Acme Solutions GmbH email", Some("DEU"))
            .await
            .expect("query");
        assert_eq!(
            hits,
            vec![SearchHit::new("https://acme-solutions.de/kontakt", "jobs@acme-solutions.de")]
        );
    }

    #[tokio::test]
    async fn api_error_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"error": "Invalid API key."})),
            )
            .mount(&server)
            .await;

        let search = SerpApiSearch::new("bad", &FetchConfig::default())
            .expect("client")
            .with_base_url(server.uri());
        let err = search.query("Acme", None).await.expect_err("401");
        assert!(matches!(err, OrgScoutError::Provider { .. }));
        assert!(err.to_string().contains("Invalid API key"));
    }
}
