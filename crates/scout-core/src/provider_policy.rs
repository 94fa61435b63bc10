use crate::{ProviderId, QueryType};

/// Credential field holding the vendor API key.
pub const API_KEY: &str = "api_key";
/// Credential field holding the vendor base URL.
pub const BASE_URL: &str = "base_url";

/// Static metadata for one provider variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    /// Providers with a weight above zero are promoted ahead of the configured chain
    /// whenever they have valid credentials.
    pub priority_weight: u32,
    pub supported_query_types: &'static [QueryType],
    pub required_fields: &'static [&'static str],
    pub default_base_url: Option<&'static str>,
}

impl ProviderPolicy {
    pub const fn alpha_default() -> Self {
        Self {
            provider_id: ProviderId::Alpha,
            priority_weight: 0,
            supported_query_types: &[QueryType::Web, QueryType::News, QueryType::Images],
            required_fields: &[API_KEY],
            default_base_url: Some("https://api.alpha-search.io"),
        }
    }

    pub const fn beta_default() -> Self {
        Self {
            provider_id: ProviderId::Beta,
            priority_weight: 0,
            supported_query_types: &[QueryType::Web, QueryType::News],
            required_fields: &[API_KEY],
            default_base_url: Some("https://api.beta-search.io"),
        }
    }

    pub const fn gamma_default() -> Self {
        Self {
            provider_id: ProviderId::Gamma,
            priority_weight: 10,
            supported_query_types: &[QueryType::Web, QueryType::News, QueryType::Images],
            required_fields: &[API_KEY],
            default_base_url: Some("https://api.gamma-search.io"),
        }
    }

    /// Delta is self-hosted: it needs a base URL and no key.
    pub const fn delta_default() -> Self {
        Self {
            provider_id: ProviderId::Delta,
            priority_weight: 0,
            supported_query_types: &[QueryType::Web, QueryType::News, QueryType::Images],
            required_fields: &[BASE_URL],
            default_base_url: None,
        }
    }

    pub const fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Alpha => Self::alpha_default(),
            ProviderId::Beta => Self::beta_default(),
            ProviderId::Gamma => Self::gamma_default(),
            ProviderId::Delta => Self::delta_default(),
        }
    }

    /// Default table in [`ProviderId::ALL`] order.
    pub fn default_table() -> Vec<Self> {
        ProviderId::ALL.into_iter().map(Self::default_for).collect()
    }

    pub fn supports(&self, query_type: QueryType) -> bool {
        self.supported_query_types.contains(&query_type)
    }

    pub fn supported_names(&self) -> Vec<&'static str> {
        self.supported_query_types
            .iter()
            .map(|query_type| query_type.as_str())
            .collect()
    }
}
