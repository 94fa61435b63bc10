use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use scout_core::{
    classify, ErrorClass, HttpClient, HttpError, HttpRequest, HttpResponse, ProviderCredentials,
    ProviderFactory, ProviderId, Query, QueryType, SearchProvider, TransportFailure, VendorFactory,
};

struct StubHttpClient {
    response: Result<HttpResponse, HttpError>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubHttpClient {
    fn new(response: Result<HttpResponse, HttpError>) -> Arc<Self> {
        Arc::new(Self {
            response,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request_count(&self) -> usize {
        self.requests.lock().expect("request log").len()
    }
}

impl HttpClient for StubHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests.lock().expect("request log").push(request);
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

struct ProviderCase {
    id: ProviderId,
    credentials: ProviderCredentials,
    /// One-hit payload in the vendor's own response shape.
    fixture: &'static str,
    supports_images: bool,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::Alpha,
            credentials: ProviderCredentials::with_api_key("alpha-key"),
            fixture: r#"{"results": [{"title": "Hit", "url": "https://hit.test"}], "total": 1}"#,
            supports_images: true,
        },
        ProviderCase {
            id: ProviderId::Beta,
            credentials: ProviderCredentials::with_api_key("beta-key"),
            fixture: r#"{"hits": [{"title": "Hit", "link": "https://hit.test"}], "estimated_total": 1}"#,
            supports_images: false,
        },
        ProviderCase {
            id: ProviderId::Gamma,
            credentials: ProviderCredentials::with_api_key("gamma-key"),
            fixture: r#"{"data": {"items": [{"name": "Hit", "url": "https://hit.test"}]}, "meta": {"total": 1}}"#,
            supports_images: true,
        },
        ProviderCase {
            id: ProviderId::Delta,
            credentials: ProviderCredentials::with_base_url("http://localhost:8888"),
            fixture: r#"{"results": [{"title": "Hit", "url": "https://hit.test"}], "number_of_results": 1}"#,
            supports_images: true,
        },
    ]
}

fn build(case: &ProviderCase, http: Arc<StubHttpClient>) -> Arc<dyn SearchProvider> {
    VendorFactory::new(http)
        .build(case.id, &case.credentials)
        .unwrap_or_else(|error| panic!("provider '{}' construction failed: {error}", case.id))
}

#[tokio::test]
async fn execute_returns_normalized_result_for_all_providers() {
    let query = Query::new("contract", QueryType::Web).expect("valid query");

    for case in provider_cases() {
        let http = StubHttpClient::new(Ok(HttpResponse::ok_json(case.fixture)));
        let provider = build(&case, http.clone());

        let result = provider
            .execute(&query)
            .await
            .unwrap_or_else(|error| panic!("provider '{}' execute failed: {error}", case.id));

        assert_eq!(provider.id(), case.id, "provider '{}': id", case.id);
        assert_eq!(result.provider_id, case.id, "provider '{}': result id", case.id);
        assert_eq!(result.items.len(), 1, "provider '{}': item count", case.id);
        assert_eq!(result.items[0].title, "Hit", "provider '{}': title", case.id);
        assert_eq!(result.items[0].url, "https://hit.test", "provider '{}': url", case.id);
        assert_eq!(result.query, "contract", "provider '{}': query echo", case.id);
        assert_eq!(result.query_type, QueryType::Web, "provider '{}': type", case.id);
        assert_eq!(result.total_results, Some(1), "provider '{}': total", case.id);
        assert_eq!(http.request_count(), 1, "provider '{}': one request", case.id);
    }
}

#[tokio::test]
async fn every_provider_serves_web_and_news() {
    for case in provider_cases() {
        let http = StubHttpClient::new(Ok(HttpResponse::ok_json(case.fixture)));
        let provider = build(&case, http);

        for query_type in [QueryType::Web, QueryType::News] {
            assert!(
                provider.supported_query_types().contains(&query_type),
                "provider '{}' must support {query_type}",
                case.id
            );
        }
        assert_eq!(
            provider.supported_query_types().contains(&QueryType::Images),
            case.supports_images,
            "provider '{}': images support",
            case.id
        );
    }
}

#[tokio::test]
async fn unsupported_query_type_fails_permanently_without_network() {
    let query = Query::new("pictures", QueryType::Images).expect("valid query");

    for case in provider_cases().into_iter().filter(|case| !case.supports_images) {
        let http = StubHttpClient::new(Ok(HttpResponse::ok_json(case.fixture)));
        let provider = build(&case, http.clone());

        let error = provider
            .execute(&query)
            .await
            .expect_err("images must be rejected");

        assert_eq!(classify(Some(&error)), ErrorClass::Permanent);
        assert!(
            error.message().contains("supported: web, news"),
            "provider '{}': message names supported set, got '{}'",
            case.id,
            error.message()
        );
        assert_eq!(http.request_count(), 0, "provider '{}': no request", case.id);
    }
}

#[tokio::test]
async fn upstream_status_codes_classify_consistently() {
    let query = Query::new("status", QueryType::Web).expect("valid query");

    for case in provider_cases() {
        for (status, expected) in [
            (429_u16, ErrorClass::Transient),
            (503, ErrorClass::Transient),
            (401, ErrorClass::Permanent),
            (400, ErrorClass::Permanent),
        ] {
            let http = StubHttpClient::new(Ok(HttpResponse::with_status(status, "")));
            let provider = build(&case, http);

            let error = provider
                .execute(&query)
                .await
                .expect_err("non-2xx must fail");

            assert_eq!(
                error.message(),
                format!("{} returned status {status}", case.id),
                "provider '{}': status message",
                case.id
            );
            assert_eq!(
                classify(Some(&error)),
                expected,
                "provider '{}': status {status}",
                case.id
            );
        }
    }
}

#[tokio::test]
async fn transport_failures_classify_by_kind_only() {
    // The query text carries a transient-looking token that must not matter.
    let query = Query::new("why 503 happens", QueryType::Web).expect("valid query");

    for case in provider_cases() {
        for (kind, expected) in [
            (TransportFailure::Timeout, ErrorClass::Transient),
            (TransportFailure::ConnectionReset, ErrorClass::Transient),
            (TransportFailure::Connect, ErrorClass::Permanent),
            (TransportFailure::Other, ErrorClass::Permanent),
        ] {
            let detail = "error sending request for url (http://host/search?q=why%20503%20happens)";
            let http = StubHttpClient::new(Err(HttpError::new(kind, detail)));
            let provider = build(&case, http);

            let error = provider
                .execute(&query)
                .await
                .expect_err("transport must fail");

            assert_eq!(
                error.message(),
                format!("{} transport error: {}", case.id, kind.summary()),
                "provider '{}': {kind:?} message",
                case.id
            );
            assert_eq!(
                classify(Some(&error)),
                expected,
                "provider '{}': {kind:?}",
                case.id
            );
        }
    }
}

#[tokio::test]
async fn health_check_reflects_probe_outcome() {
    for case in provider_cases() {
        let healthy = build(&case, StubHttpClient::new(Ok(HttpResponse::ok_json(case.fixture))));
        let report = healthy.health_check().await;
        assert!(report.success, "provider '{}': healthy probe", case.id);
        assert_eq!(report.error, None);

        let unhealthy = build(&case, StubHttpClient::new(Ok(HttpResponse::with_status(401, ""))));
        let report = unhealthy.health_check().await;
        assert!(!report.success, "provider '{}': unhealthy probe", case.id);
        assert_eq!(
            report.error.as_deref(),
            Some(format!("{} returned status 401", case.id).as_str())
        );
    }
}

#[test]
fn construction_requires_the_documented_credential() {
    let factory = VendorFactory::new(StubHttpClient::new(Ok(HttpResponse::ok_json("{}"))));

    for case in provider_cases() {
        let error = factory
            .build(case.id, &ProviderCredentials::default())
            .err()
            .unwrap_or_else(|| panic!("provider '{}' built without credentials", case.id));

        let expected_field = if case.id == ProviderId::Delta {
            "base_url"
        } else {
            "api_key"
        };
        assert_eq!(
            error.to_string(),
            format!("{} is missing required credential '{expected_field}'", case.id)
        );
    }
}
