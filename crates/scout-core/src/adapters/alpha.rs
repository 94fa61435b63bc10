use std::sync::Arc;

use serde::Deserialize;

use super::{decode, fetch, query_string};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::{ProviderError, ProviderId, Query, SearchItem, SearchResult};

/// Alpha web search API: `GET /v1/{vertical}` with an `x-api-key` header.
#[derive(Clone)]
pub struct AlphaAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
}

impl AlphaAdapter {
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
        let mut params = vec![
            ("q", query.text.clone()),
            ("count", query.max_results.to_string()),
        ];
        if let Some(date_range) = query.date_range {
            params.push(("freshness", date_range.as_str().to_owned()));
        }
        if let Some(region) = &query.region {
            params.push(("country", region.clone()));
        }
        if let Some(language) = &query.language {
            params.push(("search_lang", language.clone()));
        }
        if let Some(safe_search) = query.safe_search {
            params.push(("safesearch", safe_search.as_str().to_owned()));
        }

        let url = format!(
            "{}/v1/{}?{}",
            self.base_url,
            query.query_type.as_str(),
            query_string(&params)
        );
        HttpRequest::get(url).with_auth(&HttpAuth::Header {
            name: String::from("x-api-key"),
            value: self.api_key.clone(),
        })
    }

    pub(super) async fn search(&self, query: &Query) -> Result<SearchResult, ProviderError> {
        let body = fetch(ProviderId::Alpha, self.http_client.as_ref(), self.request(query)).await?;
        let payload: AlphaResponse = decode(ProviderId::Alpha, &body)?;

        let items = payload
            .results
            .into_iter()
            .map(|hit| SearchItem {
                title: hit.title,
                url: hit.url,
                snippet: hit.description,
                published_at: hit.age,
                image_url: hit.thumbnail,
            })
            .take(query.max_results)
            .collect();

        Ok(SearchResult {
            items,
            query: query.text.clone(),
            query_type: query.query_type,
            total_results: payload.total,
            provider_id: ProviderId::Alpha,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AlphaResponse {
    #[serde(default)]
    results: Vec<AlphaHit>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AlphaHit {
    title: String,
    url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    age: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::RecordingHttpClient;
    use crate::{DateRange, QueryType, SafeSearch};

    #[tokio::test]
    async fn builds_vertical_url_with_optional_filters() {
        let http = Arc::new(RecordingHttpClient::ok(r#"{"results": []}"#));
        let adapter = AlphaAdapter::new(http.clone(), "alpha-key", "https://api.alpha-search.io");
        let query = Query::new("rust lang", QueryType::News)
            .expect("valid query")
            .with_max_results(5)
            .expect("in range")
            .with_date_range(DateRange::Week)
            .with_safe_search(SafeSearch::Strict);

        adapter.search(&query).await.expect("empty result set");

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://api.alpha-search.io/v1/news?q=rust%20lang&count=5&freshness=week&safesearch=strict"
        );
        assert_eq!(
            requests[0].headers.get("x-api-key").map(String::as_str),
            Some("alpha-key")
        );
    }

    #[tokio::test]
    async fn normalizes_hits_and_truncates_to_max_results() {
        let http = Arc::new(RecordingHttpClient::ok(
            r#"{
                "results": [
                    {"title": "One", "url": "https://one.test", "description": "first"},
                    {"title": "Two", "url": "https://two.test"},
                    {"title": "Three", "url": "https://three.test"}
                ],
                "total": 1200
            }"#,
        ));
        let adapter = AlphaAdapter::new(http, "k", "https://api.alpha-search.io");
        let query = Query::new("numbers", QueryType::Web)
            .expect("valid query")
            .with_max_results(2)
            .expect("in range");

        let result = adapter.search(&query).await.expect("search succeeds");

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].snippet.as_deref(), Some("first"));
        assert_eq!(result.total_results, Some(1200));
        assert_eq!(result.query, "numbers");
        assert_eq!(result.provider_id, ProviderId::Alpha);
    }
}
