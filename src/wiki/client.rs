use crate::error::{Result, WikibaconError};
use crate::wiki::{Page, PageDetail, PageSource};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Safety valve on the `continue` protocol for pages with huge link lists.
const MAX_CONTINUATIONS: usize = 100;

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    query: Option<QueryBody>,
    #[serde(default, rename = "continue")]
    continuation: Option<HashMap<String, Value>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Deserialize, Default)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<RawPage>,
    #[serde(default)]
    search: Vec<TitleRef>,
}

#[derive(Deserialize)]
struct RawPage {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    redirect: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<HashMap<String, Value>>,
    #[serde(default)]
    links: Vec<TitleRef>,
    #[serde(default)]
    categories: Vec<TitleRef>,
}

impl RawPage {
    fn is_disambiguation(&self) -> bool {
        self.pageprops
            .as_ref()
            .is_some_and(|props| props.contains_key("disambiguation"))
    }
}

#[derive(Deserialize)]
struct TitleRef {
    title: String,
}

#[derive(Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

/// MediaWiki Action API client
pub struct WikiClient {
    client: Client,
    api_url: String,
}

impl WikiClient {
    /// Create a new client for the given `api.php` endpoint
    pub fn new(api_url: String, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| WikibaconError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, api_url })
    }

    async fn query(&self, params: &[(String, String)]) -> Result<QueryResponse> {
        let response = self
            .client
            .get(&self.api_url)
            .query(params)
            .send()
            .await
            .map_err(|e| WikibaconError::Fetch(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WikibaconError::Fetch(format!("MediaWiki API returned {}", status)));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| WikibaconError::Fetch(format!("Failed to parse response: {}", e)))?;

        if let Some(err) = &parsed.error {
            return Err(WikibaconError::Fetch(format!("{}: {}", err.code, err.info)));
        }

        Ok(parsed)
    }
}

fn base_params() -> Vec<(String, String)> {
    vec![
        ("action".to_string(), "query".to_string()),
        ("format".to_string(), "json".to_string()),
        ("formatversion".to_string(), "2".to_string()),
    ]
}

fn page_params(title: &str, detail: PageDetail) -> Vec<(String, String)> {
    let mut params = base_params();
    // No `redirects` parameter: redirects come back flagged instead of followed
    params.push(("titles".to_string(), title.to_string()));
    params.push(("exintro".to_string(), "1".to_string()));
    params.push(("explaintext".to_string(), "1".to_string()));
    params.push(("ppprop".to_string(), "disambiguation".to_string()));
    match detail {
        PageDetail::Summary => {
            params.push(("prop".to_string(), "info|pageprops|extracts".to_string()));
        }
        PageDetail::Full => {
            params.push((
                "prop".to_string(),
                "info|pageprops|extracts|links|categories".to_string(),
            ));
            params.push(("plnamespace".to_string(), "0".to_string()));
            params.push(("pllimit".to_string(), "max".to_string()));
            params.push(("cllimit".to_string(), "max".to_string()));
        }
    }
    params
}

fn continuation_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl PageSource for WikiClient {
    async fn fetch(&self, title: &str, detail: PageDetail) -> Result<Option<Page>> {
        let base = page_params(title, detail);
        let mut continuation: HashMap<String, Value> = HashMap::new();
        let mut page: Option<Page> = None;

        for _ in 0..MAX_CONTINUATIONS {
            let mut params = base.clone();
            params.extend(
                continuation
                    .iter()
                    .map(|(k, v)| (k.clone(), continuation_value(v))),
            );

            let response = self.query(&params).await?;
            let raw = match response.query.unwrap_or_default().pages.into_iter().next() {
                Some(raw) => raw,
                None => return Ok(None),
            };

            if raw.missing || raw.invalid || raw.redirect || raw.is_disambiguation() {
                log::debug!(
                    "Exact lookup rejected '{}' (missing={}, redirect={}, disambiguation={})",
                    title,
                    raw.missing || raw.invalid,
                    raw.redirect,
                    raw.is_disambiguation()
                );
                return Ok(None);
            }

            let merged = page.get_or_insert_with(|| Page {
                title: raw.title.clone(),
                summary: String::new(),
                links: Vec::new(),
                categories: Vec::new(),
            });
            if let Some(extract) = raw.extract.filter(|e| !e.is_empty()) {
                merged.summary = extract;
            }
            merged.links.extend(raw.links.into_iter().map(|l| l.title));
            merged.categories.extend(raw.categories.into_iter().map(|c| c.title));

            match response.continuation {
                Some(next) if !next.is_empty() => continuation = next,
                _ => return Ok(page),
            }
        }

        log::warn!("Gave up following continuations for '{}'", title);
        Ok(page)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let mut params = base_params();
        params.push(("list".to_string(), "search".to_string()));
        params.push(("srsearch".to_string(), query.to_string()));
        params.push(("srlimit".to_string(), limit.to_string()));
        params.push(("srprop".to_string(), String::new()));

        let response = self.query(&params).await?;
        Ok(response
            .query
            .unwrap_or_default()
            .search
            .into_iter()
            .map(|hit| hit.title)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new() {
        let client = WikiClient::new(
            "https://en.wikipedia.org/w/api.php".to_string(),
            "wikibacon-test",
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_full_params_request_links_and_categories() {
        let params = page_params("Dog", PageDetail::Full);
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("titles"), Some("Dog"));
        assert!(get("prop").unwrap().contains("links"));
        assert!(get("prop").unwrap().contains("categories"));
        assert_eq!(get("plnamespace"), Some("0"));
        assert!(get("redirects").is_none());
    }

    #[test]
    fn test_summary_params_skip_links() {
        let params = page_params("Dog", PageDetail::Summary);
        let prop = params.iter().find(|(k, _)| k == "prop").unwrap();
        assert!(!prop.1.contains("links"));
        assert!(params.iter().all(|(k, _)| k != "pllimit"));
    }

    #[test]
    fn test_parse_page_batch() {
        let body = r#"{
            "continue": {"plcontinue": "123|0|Zebra", "continue": "||"},
            "query": {"pages": [{
                "pageid": 4269567, "ns": 0, "title": "Dog",
                "extract": "The dog is a domesticated descendant of the wolf.",
                "links": [{"ns": 0, "title": "Wolf"}, {"ns": 0, "title": "Mammal"}],
                "categories": [{"ns": 14, "title": "Category:Mammals"}]
            }]}
        }"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        let raw = parsed.query.unwrap().pages.into_iter().next().unwrap();
        assert_eq!(raw.title, "Dog");
        assert!(!raw.missing && !raw.redirect && !raw.is_disambiguation());
        assert_eq!(raw.links.len(), 2);
        assert_eq!(raw.categories[0].title, "Category:Mammals");

        let next = parsed.continuation.unwrap();
        assert_eq!(continuation_value(&next["plcontinue"]), "123|0|Zebra");
    }

    #[test]
    fn test_parse_missing_and_disambiguation() {
        let missing: QueryResponse = serde_json::from_str(
            r#"{"query": {"pages": [{"ns": 0, "title": "Qwzxv", "missing": true}]}}"#,
        )
        .unwrap();
        assert!(missing.query.unwrap().pages[0].missing);

        let disambiguation: QueryResponse = serde_json::from_str(
            r#"{"query": {"pages": [{"ns": 0, "title": "Mercury", "pageprops": {"disambiguation": ""}}]}}"#,
        )
        .unwrap();
        assert!(disambiguation.query.unwrap().pages[0].is_disambiguation());
    }

    #[test]
    fn test_parse_search_hits() {
        let parsed: QueryResponse = serde_json::from_str(
            r#"{"query": {"search": [{"ns": 0, "title": "Cat"}, {"ns": 0, "title": "Cat (disambiguation)"}]}}"#,
        )
        .unwrap();
        let titles: Vec<String> = parsed
            .query
            .unwrap()
            .search
            .into_iter()
            .map(|h| h.title)
            .collect();
        assert_eq!(titles, vec!["Cat", "Cat (disambiguation)"]);
    }

    #[test]
    fn test_parse_api_error() {
        let parsed: QueryResponse = serde_json::from_str(
            r#"{"error": {"code": "badvalue", "info": "Unrecognized value for parameter \"prop\"."}}"#,
        )
        .unwrap();
        let err = parsed.error.unwrap();
        assert_eq!(err.code, "badvalue");
    }
}
