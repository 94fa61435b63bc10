//! Provider capability contract.
//!
//! Every vendor variant implements [`SearchProvider`]. The dispatcher never builds
//! providers itself; it asks a [`ProviderFactory`] so construction failures stay
//! distinguishable from execution failures.
//!
//! # Example Implementation
//!
//! ```rust
//! use std::future::Future;
//! use std::pin::Pin;
//!
//! use scout_core::{ProviderError, ProviderId, Query, QueryType, SearchProvider, SearchResult};
//!
//! struct Canned;
//!
//! impl SearchProvider for Canned {
//!     fn id(&self) -> ProviderId {
//!         ProviderId::Alpha
//!     }
//!
//!     fn supported_query_types(&self) -> &'static [QueryType] {
//!         &[QueryType::Web]
//!     }
//!
//!     fn execute<'a>(
//!         &'a self,
//!         query: &'a Query,
//!     ) -> Pin<Box<dyn Future<Output = Result<SearchResult, ProviderError>> + Send + 'a>> {
//!         Box::pin(async move {
//!             Ok(SearchResult {
//!                 items: Vec::new(),
//!                 query: query.text.clone(),
//!                 query_type: query.query_type,
//!                 total_results: Some(0),
//!                 provider_id: ProviderId::Alpha,
//!             })
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ProviderCredentials;
use crate::{ConstructionError, ProviderError, ProviderId, Query, QueryType, SearchResult};

/// Outcome of a provider health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub const fn healthy() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Search provider capability.
///
/// Implementations must be `Send + Sync`; concurrent dispatch calls may share them.
pub trait SearchProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn supported_query_types(&self) -> &'static [QueryType];

    /// Runs one query against the vendor. Errors carry the upstream wording so the
    /// retry classifier can tell transient failures apart.
    fn execute<'a>(
        &'a self,
        query: &'a Query,
    ) -> Pin<Box<dyn Future<Output = Result<SearchResult, ProviderError>> + Send + 'a>>;

    /// Probes the vendor with a one-result web query.
    fn health_check<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthReport> + Send + 'a>> {
        Box::pin(async move {
            let probe = Query::probe();
            match self.execute(&probe).await {
                Ok(_) => HealthReport::healthy(),
                Err(error) => HealthReport::unhealthy(error.message()),
            }
        })
    }
}

/// Rejects a query type the provider does not declare, naming the supported set.
pub fn ensure_supported(
    provider: ProviderId,
    supported: &[QueryType],
    query_type: QueryType,
) -> Result<(), ProviderError> {
    if supported.contains(&query_type) {
        return Ok(());
    }

    let names = supported
        .iter()
        .map(|query_type| query_type.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    Err(ProviderError::from_provider(
        provider,
        format!("{provider} does not support query type '{query_type}' (supported: {names})"),
    ))
}

/// Builds provider capabilities from stored credentials.
pub trait ProviderFactory: Send + Sync {
    fn build(
        &self,
        provider: ProviderId,
        credentials: &ProviderCredentials,
    ) -> Result<Arc<dyn SearchProvider>, ConstructionError>;
}
