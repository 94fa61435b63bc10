use std::collections::HashSet;

use crate::config::Settings;
use crate::provider_policy::ProviderPolicy;
use crate::{ProviderId, Query};

/// Computes the provider chain for one dispatch.
///
/// A pinned query yields exactly the pinned provider. Otherwise the configured
/// primary and fallback (those with valid credentials) form the base chain,
/// weighted providers with valid credentials are appended when absent, and the
/// result is stably sorted by descending `priority_weight`.
#[derive(Debug, Clone)]
pub struct OrderingPolicy {
    policies: Vec<ProviderPolicy>,
}

impl Default for OrderingPolicy {
    fn default() -> Self {
        Self::new(ProviderPolicy::default_table())
    }
}

impl OrderingPolicy {
    pub fn new(policies: Vec<ProviderPolicy>) -> Self {
        Self { policies }
    }

    /// Policy row for `provider`, falling back to the built-in default.
    pub fn policy_for(&self, provider: ProviderId) -> ProviderPolicy {
        self.policies
            .iter()
            .find(|policy| policy.provider_id == provider)
            .cloned()
            .unwrap_or_else(|| ProviderPolicy::default_for(provider))
    }

    fn weight(&self, provider: ProviderId) -> u32 {
        self.policy_for(provider).priority_weight
    }

    fn is_configured(&self, settings: &Settings, provider: ProviderId) -> bool {
        settings.satisfies(&self.policy_for(provider))
    }

    pub fn chain(&self, settings: &Settings, query: &Query) -> Vec<ProviderId> {
        if let Some(pinned) = query.explicit_provider {
            return vec![pinned];
        }

        let mut chain = [settings.primary, settings.fallback]
            .into_iter()
            .flatten()
            .filter(|provider| self.is_configured(settings, *provider))
            .collect::<Vec<_>>();

        for policy in &self.policies {
            if policy.priority_weight > 0
                && settings.satisfies(policy)
                && !chain.contains(&policy.provider_id)
            {
                chain.push(policy.provider_id);
            }
        }

        let mut chain = dedupe_chain(&chain);
        chain.sort_by(|left, right| self.weight(*right).cmp(&self.weight(*left)));
        chain
    }
}

fn dedupe_chain(chain: &[ProviderId]) -> Vec<ProviderId> {
    let mut seen = HashSet::new();
    let mut output = Vec::with_capacity(chain.len());

    for provider in chain {
        if seen.insert(*provider) {
            output.push(*provider);
        }
    }

    output
}
