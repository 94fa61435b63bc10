use std::collections::BTreeMap;

use scout_core::{Dispatcher, HealthReport, ProviderId, ProviderPolicy, Query, QueryType};
use serde::Serialize;

use crate::cli::ProvidersArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct ProviderRow {
    id: ProviderId,
    configured: bool,
    primary: bool,
    fallback: bool,
    priority_weight: u32,
    supported_query_types: Vec<&'static str>,
    required_fields: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    health: Option<HealthReport>,
}

#[derive(Debug, Serialize)]
struct ProvidersResponseData {
    query_type: QueryType,
    chain: Vec<ProviderId>,
    providers: Vec<ProviderRow>,
}

pub async fn run(args: &ProvidersArgs, dispatcher: &Dispatcher) -> Result<CommandResult, CliError> {
    let settings = dispatcher.resolver().load();
    let preview = Query::new("chain preview", args.query_type)?;
    let chain = dispatcher.plan(&preview);

    let mut health = if args.health {
        dispatcher
            .health()
            .await
            .into_iter()
            .map(|probe| (probe.provider, probe.report))
            .collect::<BTreeMap<_, _>>()
    } else {
        BTreeMap::new()
    };

    let providers = ProviderPolicy::default_table()
        .into_iter()
        .map(|policy| ProviderRow {
            id: policy.provider_id,
            configured: settings.satisfies(&policy),
            primary: settings.primary == Some(policy.provider_id),
            fallback: settings.fallback == Some(policy.provider_id),
            priority_weight: policy.priority_weight,
            supported_query_types: policy.supported_names(),
            required_fields: policy.required_fields,
            health: health.remove(&policy.provider_id),
        })
        .collect::<Vec<_>>();

    let mut warnings = Vec::new();
    if chain.is_empty() {
        warnings.push(String::from(
            "no provider has valid credentials; run `scout config set-key <provider>`",
        ));
    }
    for provider in &chain {
        let policy = ProviderPolicy::default_for(*provider);
        if !policy.supports(args.query_type) {
            warnings.push(format!(
                "{provider} is in the chain but does not support '{}' queries",
                args.query_type
            ));
        }
    }

    let data = serde_json::to_value(ProvidersResponseData {
        query_type: args.query_type,
        chain: chain.clone(),
        providers,
    })?;
    Ok(CommandResult::ok(data, chain).with_warnings(warnings))
}
