//! Vendor adapters.
//!
//! Each vendor is a thin request builder plus response normaliser over an
//! [`HttpClient`]. The set is closed: [`VendorAdapter`] is the only
//! [`SearchProvider`] the factory hands out.

mod alpha;
mod beta;
mod delta;
mod gamma;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

pub use alpha::AlphaAdapter;
pub use beta::BetaAdapter;
pub use delta::DeltaAdapter;
pub use gamma::GammaAdapter;

use crate::config::ProviderCredentials;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::provider::{ensure_supported, ProviderFactory};
use crate::provider_policy::{ProviderPolicy, BASE_URL};
use crate::{
    ConstructionError, ProviderError, ProviderId, Query, QueryType, SearchProvider, SearchResult,
};

/// Closed set of vendor capabilities.
#[derive(Clone)]
pub enum VendorAdapter {
    Alpha(AlphaAdapter),
    Beta(BetaAdapter),
    Gamma(GammaAdapter),
    Delta(DeltaAdapter),
}

impl SearchProvider for VendorAdapter {
    fn id(&self) -> ProviderId {
        match self {
            Self::Alpha(_) => ProviderId::Alpha,
            Self::Beta(_) => ProviderId::Beta,
            Self::Gamma(_) => ProviderId::Gamma,
            Self::Delta(_) => ProviderId::Delta,
        }
    }

    fn supported_query_types(&self) -> &'static [QueryType] {
        ProviderPolicy::default_for(self.id()).supported_query_types
    }

    fn execute<'a>(
        &'a self,
        query: &'a Query,
    ) -> Pin<Box<dyn Future<Output = Result<SearchResult, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            ensure_supported(self.id(), self.supported_query_types(), query.query_type)?;
            match self {
                Self::Alpha(adapter) => adapter.search(query).await,
                Self::Beta(adapter) => adapter.search(query).await,
                Self::Gamma(adapter) => adapter.search(query).await,
                Self::Delta(adapter) => adapter.search(query).await,
            }
        })
    }
}

/// Builds the capability for `provider` from its stored credentials.
///
/// Fails without any network traffic when a required credential is blank or the
/// base URL is not an http(s) URL.
pub fn build_capability(
    provider: ProviderId,
    credentials: &ProviderCredentials,
    http_client: Arc<dyn HttpClient>,
) -> Result<VendorAdapter, ConstructionError> {
    let policy = ProviderPolicy::default_for(provider);
    for field in policy.required_fields {
        let present = credentials
            .field(field)
            .is_some_and(|value| !value.trim().is_empty());
        if !present {
            return Err(ConstructionError::MissingCredential { provider, field });
        }
    }
    let base_url = resolve_base_url(provider, credentials, policy.default_base_url)?;
    let api_key = credentials.api_key.trim().to_owned();

    Ok(match provider {
        ProviderId::Alpha => VendorAdapter::Alpha(AlphaAdapter::new(http_client, api_key, base_url)),
        ProviderId::Beta => VendorAdapter::Beta(BetaAdapter::new(http_client, api_key, base_url)),
        ProviderId::Gamma => VendorAdapter::Gamma(GammaAdapter::new(http_client, api_key, base_url)),
        ProviderId::Delta => VendorAdapter::Delta(DeltaAdapter::new(http_client, api_key, base_url)),
    })
}

/// [`ProviderFactory`] over a shared HTTP client.
#[derive(Clone)]
pub struct VendorFactory {
    http_client: Arc<dyn HttpClient>,
}

impl Default for VendorFactory {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::default()))
    }
}

impl VendorFactory {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }
}

impl ProviderFactory for VendorFactory {
    fn build(
        &self,
        provider: ProviderId,
        credentials: &ProviderCredentials,
    ) -> Result<Arc<dyn SearchProvider>, ConstructionError> {
        let adapter = build_capability(provider, credentials, Arc::clone(&self.http_client))?;
        Ok(Arc::new(adapter))
    }
}

fn resolve_base_url(
    provider: ProviderId,
    credentials: &ProviderCredentials,
    default: Option<&'static str>,
) -> Result<String, ConstructionError> {
    let configured = credentials.base_url.trim();
    let base_url = if configured.is_empty() {
        match default {
            Some(default) => default,
            None => {
                return Err(ConstructionError::MissingCredential {
                    provider,
                    field: BASE_URL,
                })
            }
        }
    } else {
        configured
    };

    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConstructionError::InvalidBaseUrl {
            provider,
            value: base_url.to_owned(),
        });
    }
    Ok(base_url.trim_end_matches('/').to_owned())
}

/// Sends `request` and returns the body of a 2xx response.
///
/// Messages carry only fixed wording: `"<provider> transport error: <kind>"` or
/// `"<provider> returned status <code>"`. Library detail goes to the log.
async fn fetch(
    provider: ProviderId,
    client: &dyn HttpClient,
    request: HttpRequest,
) -> Result<String, ProviderError> {
    let response = client.execute(request).await.map_err(|error| {
        debug!(%provider, kind = ?error.kind(), detail = error.detail(), "transport failure");
        ProviderError::from_provider(
            provider,
            format!("{provider} transport error: {}", error.kind().summary()),
        )
    })?;

    if !response.is_success() {
        return Err(ProviderError::from_provider(
            provider,
            format!("{provider} returned status {}", response.status),
        ));
    }
    Ok(response.body)
}

fn decode<T: DeserializeOwned>(provider: ProviderId, body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body).map_err(|error| {
        debug!(%provider, error = %error, "payload did not decode");
        ProviderError::from_provider(provider, format!("{provider} sent a malformed payload"))
    })
}

/// Renders `key=value` pairs as a percent-encoded query string.
fn query_string(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};

    /// Replays one canned response and records every request.
    #[derive(Debug)]
    pub struct RecordingHttpClient {
        response: Result<HttpResponse, HttpError>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingHttpClient {
        pub fn responding(response: Result<HttpResponse, HttpError>) -> Self {
            Self {
                response,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn ok(body: &str) -> Self {
            Self::responding(Ok(HttpResponse::ok_json(body)))
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .clone()
        }
    }

    impl HttpClient for RecordingHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store should not be poisoned")
                .push(request);
            let response = self.response.clone();
            Box::pin(async move { response })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingHttpClient;
    use super::*;
    use crate::classifier::{classify, ErrorClass};
    use crate::http_client::{HttpError, HttpResponse, TransportFailure};
    use crate::provider_policy::API_KEY;

    fn client(body: &str) -> Arc<RecordingHttpClient> {
        Arc::new(RecordingHttpClient::ok(body))
    }

    #[test]
    fn missing_api_key_fails_construction() {
        let error = build_capability(
            ProviderId::Alpha,
            &ProviderCredentials::default(),
            client("{}"),
        )
        .err()
        .expect("construction should fail");

        assert_eq!(
            error,
            ConstructionError::MissingCredential {
                provider: ProviderId::Alpha,
                field: API_KEY,
            }
        );
        assert_eq!(
            error.to_string(),
            "alpha is missing required credential 'api_key'"
        );
    }

    #[test]
    fn delta_requires_base_url() {
        let error = build_capability(
            ProviderId::Delta,
            &ProviderCredentials::with_api_key("unused"),
            client("{}"),
        )
        .err()
        .expect("construction should fail");

        assert!(matches!(
            error,
            ConstructionError::MissingCredential {
                field: BASE_URL,
                ..
            }
        ));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let credentials = ProviderCredentials {
            api_key: String::from("k"),
            base_url: String::from("ftp://mirror"),
        };

        let error = build_capability(ProviderId::Gamma, &credentials, client("{}"))
            .err()
            .expect("construction should fail");

        assert!(matches!(error, ConstructionError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn factory_builds_every_variant_with_its_identity() {
        let factory = VendorFactory::new(client("{}"));
        for provider in ProviderId::ALL {
            let credentials = ProviderCredentials {
                api_key: String::from("key"),
                base_url: String::from("http://localhost:8888/"),
            };
            let capability = factory
                .build(provider, &credentials)
                .expect("credentials are complete");
            assert_eq!(capability.id(), provider);
        }
    }

    #[tokio::test]
    async fn unsupported_query_type_is_rejected_before_any_request() {
        let http = client("{}");
        let adapter = build_capability(
            ProviderId::Beta,
            &ProviderCredentials::with_api_key("k"),
            http.clone(),
        )
        .expect("valid credentials");
        let query = Query::new("cats", QueryType::Images).expect("valid query");

        let error = adapter.execute(&query).await.expect_err("images unsupported");

        assert_eq!(classify(Some(&error)), ErrorClass::Permanent);
        assert!(error.message().contains("supported: web, news"));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn status_failures_keep_the_code_for_classification() {
        let http = Arc::new(RecordingHttpClient::responding(Ok(HttpResponse::with_status(
            503, "",
        ))));
        let adapter = build_capability(
            ProviderId::Alpha,
            &ProviderCredentials::with_api_key("k"),
            http,
        )
        .expect("valid credentials");
        let query = Query::new("rust", QueryType::Web).expect("valid query");

        let error = adapter.execute(&query).await.expect_err("status 503");

        assert_eq!(error.message(), "alpha returned status 503");
        assert_eq!(classify(Some(&error)), ErrorClass::Transient);
    }

    #[tokio::test]
    async fn transport_timeouts_classify_as_transient() {
        let http = Arc::new(RecordingHttpClient::responding(Err(HttpError::new(
            TransportFailure::Timeout,
            "operation timed out",
        ))));
        let adapter = build_capability(
            ProviderId::Gamma,
            &ProviderCredentials::with_api_key("k"),
            http,
        )
        .expect("valid credentials");
        let query = Query::new("rust", QueryType::Web).expect("valid query");

        let error = adapter.execute(&query).await.expect_err("transport failure");

        assert_eq!(classify(Some(&error)), ErrorClass::Transient);
    }

    #[tokio::test]
    async fn malformed_payload_is_permanent() {
        let adapter = build_capability(
            ProviderId::Alpha,
            &ProviderCredentials::with_api_key("k"),
            client("not json"),
        )
        .expect("valid credentials");
        let query = Query::new("rust", QueryType::Web).expect("valid query");

        let error = adapter.execute(&query).await.expect_err("bad payload");

        assert!(error.message().starts_with("alpha sent a malformed payload"));
        assert_eq!(classify(Some(&error)), ErrorClass::Permanent);
    }

    #[tokio::test]
    async fn decode_position_never_reaches_the_classifier() {
        // Leading whitespace puts the syntax error at column 429.
        let body = format!("{}x", " ".repeat(428));
        let adapter = build_capability(
            ProviderId::Alpha,
            &ProviderCredentials::with_api_key("k"),
            client(&body),
        )
        .expect("valid credentials");
        let query = Query::new("rust", QueryType::Web).expect("valid query");

        let error = adapter.execute(&query).await.expect_err("bad payload");

        assert_eq!(error.message(), "alpha sent a malformed payload");
        assert_eq!(classify(Some(&error)), ErrorClass::Permanent);
    }

    #[tokio::test]
    async fn transport_detail_stays_out_of_the_message() {
        let http = Arc::new(RecordingHttpClient::responding(Err(HttpError::new(
            TransportFailure::Connect,
            "error sending request: tcp connect error: Connection refused (os error 111) 503",
        ))));
        let adapter = build_capability(
            ProviderId::Delta,
            &ProviderCredentials::with_base_url("http://127.0.0.1:1"),
            http,
        )
        .expect("valid credentials");
        let query = Query::new("status 503 explained", QueryType::Web).expect("valid query");

        let error = adapter.execute(&query).await.expect_err("refused");

        assert_eq!(error.message(), "delta transport error: connection failed");
        assert_eq!(classify(Some(&error)), ErrorClass::Permanent);
    }

    #[tokio::test]
    async fn connection_resets_stay_transient() {
        let http = Arc::new(RecordingHttpClient::responding(Err(HttpError::new(
            TransportFailure::ConnectionReset,
            "connection reset by peer",
        ))));
        let adapter = build_capability(
            ProviderId::Beta,
            &ProviderCredentials::with_api_key("k"),
            http,
        )
        .expect("valid credentials");
        let query = Query::new("rust", QueryType::Web).expect("valid query");

        let error = adapter.execute(&query).await.expect_err("reset");

        assert_eq!(
            error.message(),
            "beta transport error: connection reset (ECONNRESET)"
        );
        assert_eq!(classify(Some(&error)), ErrorClass::Transient);
    }

    #[test]
    fn query_string_percent_encodes_values() {
        assert_eq!(
            query_string(&[("q", String::from("rust & tokio")), ("n", String::from("5"))]),
            "q=rust%20%26%20tokio&n=5"
        );
    }
}
