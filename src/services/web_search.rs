use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchHit>>;
}

/// Web search over a bearer-token JSON endpoint.
pub struct HttpWebSearch {
    http: reqwest::Client,
    endpoint: Option<String>,
    api_key: Option<SecretString>,
}

impl HttpWebSearch {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: config.search_api_endpoint.clone(),
            api_key: config.search_api_key.clone(),
        })
    }
}

#[async_trait]
impl WebSearch for HttpWebSearch {
    async fn search(&self, query: &str, max_results: usize) -> AppResult<Vec<SearchHit>> {
        let (Some(endpoint), Some(key)) = (&self.endpoint, &self.api_key) else {
            return Err(AppError::NotConfigured(
                "SEARCH_API_KEY and SEARCH_API_ENDPOINT must both be set".to_string(),
            ));
        };

        log::info!("Web search: {}", query);
        let response = self
            .http
            .get(endpoint)
            .bearer_auth(key.expose_secret())
            .query(&[("q", query.to_string()), ("num", max_results.to_string())])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        Ok(parse_search_results(&body, max_results))
    }
}

/// Accepts either an `items` or a `results` list whose entries carry a
/// `link` or `url`. Entries without a URL are skipped.
pub fn parse_search_results(body: &Value, max_results: usize) -> Vec<SearchHit> {
    let entries = body
        .get("items")
        .or_else(|| body.get("results"))
        .and_then(Value::as_array);

    let Some(entries) = entries else {
        return Vec::new();
    };

    let text = |entry: &Value, keys: &[&str]| -> String {
        keys.iter()
            .find_map(|key| entry.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    };

    entries
        .iter()
        .filter_map(|entry| {
            let url = text(entry, &["link", "url"]);
            if url.is_empty() {
                return None;
            }
            Some(SearchHit {
                title: text(entry, &["title"]),
                url,
                snippet: text(entry, &["snippet", "description", "content"]),
            })
        })
        .take(max_results)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_items_with_link() {
        let body = json!({
            "items": [
                { "title": "Rust Book", "link": "https://doc.rust-lang.org/book/", "snippet": "The book" },
                { "title": "No link" },
                { "title": "Rustlings", "link": "https://github.com/rust-lang/rustlings" }
            ]
        });
        let hits = parse_search_results(&body, 5);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].snippet, "The book");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn parses_results_with_url_and_caps_count() {
        let body = json!({
            "results": [
                { "title": "a", "url": "https://a.test", "description": "first" },
                { "title": "b", "url": "https://b.test" },
                { "title": "c", "url": "https://c.test" }
            ]
        });
        let hits = parse_search_results(&body, 2);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://a.test");
        assert_eq!(hits[0].snippet, "first");
    }

    #[test]
    fn unknown_shape_yields_nothing() {
        assert!(parse_search_results(&json!({ "data": [] }), 5).is_empty());
        assert!(parse_search_results(&json!("oops"), 5).is_empty());
    }

    #[actix_web::test]
    async fn unconfigured_search_fails() {
        let search = HttpWebSearch::new(&Config::test_config()).expect("client should build");
        let err = search
            .search("rust", 5)
            .await
            .expect_err("search without config should fail");

        assert!(matches!(err, AppError::NotConfigured(_)));
    }
}
