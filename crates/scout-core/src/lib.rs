//! Core contracts for scout.
//!
//! This crate contains:
//! - Provider identifiers, static provider metadata, and query/result models
//! - Settings, the external store contract, and the caching resolver
//! - Transient/permanent error classification and bounded retry
//! - Chain ordering and the dispatch orchestrator
//! - Vendor adapters over a pluggable HTTP client

pub mod adapters;
pub mod classifier;
pub mod config;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod http_client;
pub mod ordering;
pub mod provider;
pub mod provider_policy;
pub mod query;
pub mod retry;
pub mod source;

pub use adapters::{
    build_capability, AlphaAdapter, BetaAdapter, DeltaAdapter, GammaAdapter, VendorAdapter,
    VendorFactory,
};
pub use classifier::{classify, classify_message, ErrorClass};
pub use config::{
    ConfigResolver, MemoryStore, ProviderCredentials, Settings, SettingsStore, SETTINGS_KEY,
};
pub use control::{CancelToken, DispatchControl};
pub use dispatch::{
    DispatchOptions, DispatchSuccess, Dispatcher, DispatcherBuilder, ProviderHealth,
};
pub use error::{
    ConstructionError, DispatchError, ProviderError, ProviderFailure, StoreError, ValidationError,
};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    TransportFailure,
};
pub use ordering::OrderingPolicy;
pub use provider::{HealthReport, ProviderFactory, SearchProvider};
pub use provider_policy::ProviderPolicy;
pub use query::{DateRange, Query, QueryType, SafeSearch, SearchItem, SearchResult};
pub use retry::{
    FixedJitter, Jitter, RandomJitter, RetryExecutor, RetryPolicy, SeededJitter, Sleeper,
    TokioSleeper,
};
pub use source::ProviderId;
