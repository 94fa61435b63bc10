use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{decode, fetch};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::{ProviderError, ProviderId, Query, SearchItem, SearchResult};

/// Beta search API: JSON `POST /search` with bearer auth. Web and news only.
#[derive(Clone)]
pub struct BetaAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
}

impl BetaAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    fn request(&self, query: &Query) -> HttpRequest {
        let mut body = Map::new();
        body.insert(String::from("query"), json!(query.text));
        body.insert(String::from("type"), json!(query.query_type.as_str()));
        body.insert(String::from("num_results"), json!(query.max_results));
        if let Some(date_range) = query.date_range {
            body.insert(String::from("time_range"), json!(date_range.as_str()));
        }
        if let Some(region) = &query.region {
            body.insert(String::from("region"), json!(region));
        }
        if let Some(language) = &query.language {
            body.insert(String::from("language"), json!(language));
        }
        if let Some(safe_search) = query.safe_search {
            body.insert(String::from("safe"), json!(safe_search.as_str()));
        }

        HttpRequest::post(format!("{}/search", self.base_url))
            .with_json_body(&Value::Object(body))
            .with_auth(&HttpAuth::BearerToken(self.api_key.clone()))
    }

    pub(super) async fn search(&self, query: &Query) -> Result<SearchResult, ProviderError> {
        let body = fetch(ProviderId::Beta, self.http_client.as_ref(), self.request(query)).await?;
        let payload: BetaResponse = decode(ProviderId::Beta, &body)?;

        let items = payload
            .hits
            .into_iter()
            .map(|hit| SearchItem {
                title: hit.title,
                url: hit.link,
                snippet: hit.snippet,
                published_at: hit.published,
                image_url: None,
            })
            .take(query.max_results)
            .collect();

        Ok(SearchResult {
            items,
            query: query.text.clone(),
            query_type: query.query_type,
            total_results: payload.estimated_total,
            provider_id: ProviderId::Beta,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BetaResponse {
    #[serde(default)]
    hits: Vec<BetaHit>,
    #[serde(default)]
    estimated_total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BetaHit {
    title: String,
    link: String,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    published: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::RecordingHttpClient;
    use crate::http_client::HttpMethod;
    use crate::QueryType;

    #[tokio::test]
    async fn posts_json_body_with_bearer_token() {
        let http = Arc::new(RecordingHttpClient::ok(r#"{"hits": []}"#));
        let adapter = BetaAdapter::new(http.clone(), "beta-token", "https://api.beta-search.io");
        let query = Query::new("tokio", QueryType::News)
            .expect("valid query")
            .with_region("de");

        adapter.search(&query).await.expect("empty result set");

        let request = http.requests().remove(0);
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "https://api.beta-search.io/search");
        assert_eq!(
            request.headers.get("authorization").map(String::as_str),
            Some("Bearer beta-token")
        );

        let body: Value =
            serde_json::from_str(request.body.as_deref().expect("json body")).expect("valid json");
        assert_eq!(body["query"], "tokio");
        assert_eq!(body["type"], "news");
        assert_eq!(body["num_results"], 10);
        assert_eq!(body["region"], "de");
        assert!(body.get("language").is_none());
    }

    #[tokio::test]
    async fn maps_link_field_to_url() {
        let http = Arc::new(RecordingHttpClient::ok(
            r#"{"hits": [{"title": "Docs", "link": "https://docs.test", "published": "2024-01-02"}], "estimated_total": 7}"#,
        ));
        let adapter = BetaAdapter::new(http, "k", "https://api.beta-search.io");
        let query = Query::new("docs", QueryType::Web).expect("valid query");

        let result = adapter.search(&query).await.expect("search succeeds");

        assert_eq!(result.items[0].url, "https://docs.test");
        assert_eq!(result.items[0].published_at.as_deref(), Some("2024-01-02"));
        assert_eq!(result.total_results, Some(7));
    }
}
