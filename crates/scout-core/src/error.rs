use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

use crate::ProviderId;

/// Validation and contract errors exposed by `scout-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("query text cannot be empty")]
    EmptyQuery,
    #[error("max_results {value} is outside {min}..={max}")]
    MaxResultsOutOfRange { value: usize, min: usize, max: usize },

    #[error("invalid provider '{value}', expected one of alpha, beta, gamma, delta")]
    InvalidProvider { value: String },
    #[error("invalid query type '{value}', expected one of web, news, images")]
    InvalidQueryType { value: String },
    #[error("invalid date range '{value}', expected one of day, week, month, year")]
    InvalidDateRange { value: String },
    #[error("invalid safe search level '{value}', expected one of off, moderate, strict")]
    InvalidSafeSearch { value: String },
}

/// Failure reported by a provider while executing a query.
///
/// The message is what [`crate::classifier::classify`] inspects, so transport and
/// status failures keep the upstream wording (`"503"`, `"timeout"`, ...) intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    provider: Option<ProviderId>,
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            provider: None,
            message: message.into(),
        }
    }

    pub fn from_provider(provider: ProviderId, message: impl Into<String>) -> Self {
        Self {
            provider: Some(provider),
            message: message.into(),
        }
    }

    pub const fn provider(&self) -> Option<ProviderId> {
        self.provider
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Failure to build a provider capability from its stored credentials.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("{provider} is missing required credential '{field}'")]
    MissingCredential {
        provider: ProviderId,
        field: &'static str,
    },
    #[error("{provider} base url '{value}' must start with http:// or https://")]
    InvalidBaseUrl { provider: ProviderId, value: String },
}

/// Settings store read/write failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("settings store error: {0}")]
    Backend(String),
}

/// Terminal failure text recorded for one chain entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub message: String,
}

/// Caller-facing dispatch failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No search provider configured")]
    Configuration,

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("{}", aggregate_message(.failures))]
    Aggregate { failures: Vec<ProviderFailure> },

    #[error("dispatch was cancelled")]
    Cancelled,

    #[error("dispatch deadline of {budget_ms}ms exceeded")]
    DeadlineExceeded { budget_ms: u64 },
}

impl DispatchError {
    /// Cancellation and deadline expiry stop the chain walk outright.
    pub const fn halts_chain(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded { .. })
    }
}

fn aggregate_message(failures: &[ProviderFailure]) -> String {
    let mut parts = Vec::with_capacity(failures.len());
    for (index, failure) in failures.iter().enumerate() {
        if index == 0 {
            parts.push(format!(
                "Primary provider ({}) failed: {}.",
                failure.provider, failure.message
            ));
        } else {
            parts.push(format!(
                "Fallback provider ({}) also failed: {}.",
                failure.provider, failure.message
            ));
        }
    }
    parts.join(" ")
}
