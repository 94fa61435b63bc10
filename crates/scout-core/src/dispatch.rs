use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::adapters::VendorFactory;
use crate::config::{ConfigResolver, ProviderCredentials, Settings};
use crate::control::{CancelToken, DispatchControl};
use crate::ordering::OrderingPolicy;
use crate::provider::{ensure_supported, HealthReport, ProviderFactory};
use crate::retry::RetryExecutor;
use crate::{DispatchError, ProviderFailure, ProviderId, Query, SearchResult};

/// Per-dispatcher limits beyond the retry policy.
///
/// Attempts per chain entry come from the [`RetryExecutor`]'s [`RetryPolicy`](crate::RetryPolicy).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Wall-clock budget for the whole chain walk.
    pub deadline: Option<Duration>,
}

/// Successful dispatch with the route it took.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchSuccess {
    pub result: SearchResult,
    pub provider: ProviderId,
    pub chain: Vec<ProviderId>,
    pub failures: Vec<ProviderFailure>,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
}

/// Health probe outcome for one configured provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub provider: ProviderId,
    #[serde(flatten)]
    pub report: HealthReport,
}

/// Resolves settings, plans the chain, and walks it with bounded retries.
pub struct Dispatcher {
    resolver: Arc<ConfigResolver>,
    factory: Arc<dyn ProviderFactory>,
    ordering: OrderingPolicy,
    retry: RetryExecutor,
    options: DispatchOptions,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("ordering", &self.ordering)
            .field("retry", &self.retry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Dispatcher`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use scout_core::{
///     ConfigResolver, DispatchOptions, DispatcherBuilder, MemoryStore, RetryExecutor, RetryPolicy,
/// };
///
/// let resolver = Arc::new(ConfigResolver::new(Arc::new(MemoryStore::new())));
/// let dispatcher = DispatcherBuilder::new(resolver)
///     .retry(RetryExecutor::new(RetryPolicy::with_max_attempts(2)))
///     .options(DispatchOptions {
///         deadline: Some(Duration::from_secs(20)),
///     })
///     .build();
///
/// assert_eq!(dispatcher.max_attempts(), 2);
/// ```
pub struct DispatcherBuilder {
    resolver: Arc<ConfigResolver>,
    factory: Option<Arc<dyn ProviderFactory>>,
    ordering: OrderingPolicy,
    retry: RetryExecutor,
    options: DispatchOptions,
}

impl DispatcherBuilder {
    pub fn new(resolver: Arc<ConfigResolver>) -> Self {
        Self {
            resolver,
            factory: None,
            ordering: OrderingPolicy::default(),
            retry: RetryExecutor::default(),
            options: DispatchOptions::default(),
        }
    }

    pub fn factory(mut self, factory: Arc<dyn ProviderFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn retry(mut self, retry: RetryExecutor) -> Self {
        self.retry = retry;
        self
    }

    pub fn options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Uses the reqwest-backed [`VendorFactory`] unless a factory was supplied.
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            resolver: self.resolver,
            factory: self
                .factory
                .unwrap_or_else(|| Arc::new(VendorFactory::default())),
            ordering: self.ordering,
            retry: self.retry,
            options: self.options,
        }
    }
}

impl Dispatcher {
    pub fn new(resolver: Arc<ConfigResolver>, factory: Arc<dyn ProviderFactory>) -> Self {
        DispatcherBuilder::new(resolver).factory(factory).build()
    }

    pub fn resolver(&self) -> &Arc<ConfigResolver> {
        &self.resolver
    }

    pub const fn options(&self) -> DispatchOptions {
        self.options
    }

    /// Calls allowed per chain entry, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.retry.policy().max_attempts
    }

    /// Chain a query would walk under the current settings.
    pub fn plan(&self, query: &Query) -> Vec<ProviderId> {
        self.ordering.chain(&self.resolver.load(), query)
    }

    /// Runs `query` and returns only the result.
    pub async fn dispatch(&self, query: &Query) -> Result<SearchResult, DispatchError> {
        self.dispatch_detailed(query, &CancelToken::new())
            .await
            .map(|success| success.result)
    }

    /// Runs `query`, reporting the selected provider, the chain, and earlier failures.
    ///
    /// Errors:
    /// - [`DispatchError::Configuration`] when nothing is pinned and no primary is set.
    /// - The pinned provider's own error, unchanged, when a pinned call fails.
    /// - [`DispatchError::Aggregate`] when every chain entry failed.
    /// - [`DispatchError::Cancelled`] / [`DispatchError::DeadlineExceeded`] as soon as
    ///   either is observed.
    pub async fn dispatch_detailed(
        &self,
        query: &Query,
        cancel: &CancelToken,
    ) -> Result<DispatchSuccess, DispatchError> {
        let dispatch_id = Uuid::new_v4();
        let span = info_span!(
            "dispatch",
            %dispatch_id,
            query_type = %query.query_type,
            pinned = ?query.explicit_provider,
        );
        self.walk(query, cancel).instrument(span).await
    }

    async fn walk(
        &self,
        query: &Query,
        cancel: &CancelToken,
    ) -> Result<DispatchSuccess, DispatchError> {
        let started = Instant::now();
        let settings = self.resolver.load();
        let pinned = query.explicit_provider;

        if pinned.is_none() && settings.primary.is_none() {
            warn!("no search provider configured");
            return Err(DispatchError::Configuration);
        }

        let chain = self.ordering.chain(&settings, query);
        if chain.is_empty() {
            warn!("no provider in the chain has valid credentials");
            return Err(DispatchError::Configuration);
        }
        debug!(?chain, "planned provider chain");

        let control = DispatchControl::new(cancel.clone(), self.options.deadline);
        let mut failures = Vec::with_capacity(chain.len());

        for provider in chain.iter().copied() {
            match self.attempt(provider, &settings, query, &control).await {
                Ok(result) => {
                    let mut warnings = Vec::new();
                    if !failures.is_empty() {
                        warnings.push(format!(
                            "fallback succeeded with '{provider}' after {} failed provider(s)",
                            failures.len()
                        ));
                    }
                    let latency_ms = elapsed_ms(started);
                    info!(%provider, latency_ms, items = result.items.len(), "dispatch succeeded");

                    return Ok(DispatchSuccess {
                        result,
                        provider,
                        chain,
                        failures,
                        warnings,
                        latency_ms,
                    });
                }
                Err(error) if error.halts_chain() || pinned.is_some() => {
                    warn!(%provider, error = %error, "dispatch stopped");
                    return Err(error);
                }
                Err(error) => {
                    info!(%provider, error = %error, "provider failed, advancing chain");
                    failures.push(ProviderFailure {
                        provider,
                        message: error.to_string(),
                    });
                }
            }
        }

        warn!(attempted = failures.len(), "every provider in the chain failed");
        Err(DispatchError::Aggregate { failures })
    }

    async fn attempt(
        &self,
        provider: ProviderId,
        settings: &Settings,
        query: &Query,
        control: &DispatchControl,
    ) -> Result<SearchResult, DispatchError> {
        control.check()?;

        let empty = ProviderCredentials::default();
        let credentials = settings.credentials(provider).unwrap_or(&empty);
        let capability = self.factory.build(provider, credentials)?;
        ensure_supported(provider, capability.supported_query_types(), query.query_type)?;

        self.retry
            .run(capability.as_ref(), query, control)
            .await
    }

    /// Probes every provider with valid credentials.
    pub async fn health(&self) -> Vec<ProviderHealth> {
        let settings = self.resolver.load();
        let mut reports = Vec::new();

        for provider in settings.configured_providers() {
            let empty = ProviderCredentials::default();
            let credentials = settings.credentials(provider).unwrap_or(&empty);
            let report = match self.factory.build(provider, credentials) {
                Ok(capability) => capability.health_check().await,
                Err(error) => HealthReport::unhealthy(error.to_string()),
            };
            debug!(%provider, success = report.success, "health probe finished");
            reports.push(ProviderHealth { provider, report });
        }

        reports
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
