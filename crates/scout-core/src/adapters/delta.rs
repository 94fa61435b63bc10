use std::sync::Arc;

use serde::Deserialize;

use super::{decode, fetch, query_string};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::{ProviderError, ProviderId, Query, QueryType, SafeSearch, SearchItem, SearchResult};

/// Self-hosted metasearch instance. The API key is optional and only sent when set.
#[derive(Clone)]
pub struct DeltaAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
}

impl DeltaAdapter {
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
        let category = match query.query_type {
            QueryType::Web => "general",
            QueryType::News => "news",
            QueryType::Images => "images",
        };
        let mut params = vec![
            ("q", query.text.clone()),
            ("format", String::from("json")),
            ("categories", String::from(category)),
        ];
        if let Some(date_range) = query.date_range {
            params.push(("time_range", date_range.as_str().to_owned()));
        }
        if let Some(language) = query.language.as_ref().or(query.region.as_ref()) {
            params.push(("language", language.clone()));
        }
        if let Some(safe_search) = query.safe_search {
            let level = match safe_search {
                SafeSearch::Off => "0",
                SafeSearch::Moderate => "1",
                SafeSearch::Strict => "2",
            };
            params.push(("safesearch", String::from(level)));
        }

        let request =
            HttpRequest::get(format!("{}/search?{}", self.base_url, query_string(&params)));
        if self.api_key.is_empty() {
            request
        } else {
            request.with_auth(&HttpAuth::BearerToken(self.api_key.clone()))
        }
    }

    pub(super) async fn search(&self, query: &Query) -> Result<SearchResult, ProviderError> {
        let body = fetch(ProviderId::Delta, self.http_client.as_ref(), self.request(query)).await?;
        let payload: DeltaResponse = decode(ProviderId::Delta, &body)?;

        let total_results = payload
            .number_of_results
            .filter(|total| *total > 0)
            .or_else(|| u64::try_from(payload.results.len()).ok());
        let items = payload
            .results
            .into_iter()
            .map(|hit| SearchItem {
                title: hit.title,
                url: hit.url,
                snippet: hit.content,
                published_at: hit.published_date,
                image_url: hit.img_src,
            })
            .take(query.max_results)
            .collect();

        Ok(SearchResult {
            items,
            query: query.text.clone(),
            query_type: query.query_type,
            total_results,
            provider_id: ProviderId::Delta,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeltaResponse {
    #[serde(default)]
    results: Vec<DeltaHit>,
    #[serde(default)]
    number_of_results: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DeltaHit {
    title: String,
    url: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "publishedDate")]
    published_date: Option<String>,
    #[serde(default)]
    img_src: Option<String>,
}
