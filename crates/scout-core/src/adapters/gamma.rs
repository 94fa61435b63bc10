use std::sync::Arc;

use serde::Deserialize;

use super::{decode, fetch, query_string};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::{ProviderError, ProviderId, Query, SearchItem, SearchResult};

#[derive(Clone)]
pub struct GammaAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
}

impl GammaAdapter {
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
            ("vertical", query.query_type.as_str().to_owned()),
            ("limit", query.max_results.to_string()),
        ];
        if let Some(date_range) = query.date_range {
            params.push(("recency", date_range.as_str().to_owned()));
        }
        if let Some(region) = &query.region {
            params.push(("market", region.clone()));
        }
        if let Some(language) = &query.language {
            params.push(("lang", language.clone()));
        }
        if let Some(safe_search) = query.safe_search {
            params.push(("safe", safe_search.as_str().to_owned()));
        }

        HttpRequest::get(format!("{}/search?{}", self.base_url, query_string(&params)))
            .with_auth(&HttpAuth::Header {
                name: String::from("x-gamma-key"),
                value: self.api_key.clone(),
            })
    }

    pub(super) async fn search(&self, query: &Query) -> Result<SearchResult, ProviderError> {
        let body = fetch(ProviderId::Gamma, self.http_client.as_ref(), self.request(query)).await?;
        let payload: GammaResponse = decode(ProviderId::Gamma, &body)?;

        let items = payload
            .data
            .items
            .into_iter()
            .map(|item| SearchItem {
                title: item.name,
                url: item.url,
                snippet: item.summary,
                published_at: item.date,
                image_url: item.image,
            })
            .take(query.max_results)
            .collect();

        Ok(SearchResult {
            items,
            query: query.text.clone(),
            query_type: query.query_type,
            total_results: payload.meta.and_then(|meta| meta.total),
            provider_id: ProviderId::Gamma,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GammaResponse {
    #[serde(default)]
    data: GammaData,
    #[serde(default)]
    meta: Option<GammaMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct GammaData {
    #[serde(default)]
    items: Vec<GammaItem>,
}

#[derive(Debug, Deserialize)]
struct GammaItem {
    name: String,
    url: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GammaMeta {
    #[serde(default)]
    total: Option<u64>,
}
