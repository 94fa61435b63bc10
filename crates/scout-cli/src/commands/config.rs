use std::collections::BTreeMap;
use std::path::Path;

use scout_core::config::redact;
use scout_core::{
    ConfigResolver, OrderingPolicy, ProviderCredentials, ProviderId, Query, QueryType, Settings,
};
use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, SelectArgs, SetKeyArgs};
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct CredentialView {
    api_key: String,
    base_url: String,
    valid: bool,
}

#[derive(Debug, Serialize)]
struct SettingsView {
    path: String,
    primary: Option<ProviderId>,
    fallback: Option<ProviderId>,
    resolved_primary: Option<ProviderId>,
    resolved_fallback: Option<ProviderId>,
    providers: BTreeMap<ProviderId, CredentialView>,
}

pub fn run(args: &ConfigArgs, resolver: &ConfigResolver, path: &Path) -> Result<CommandResult, CliError> {
    match &args.command {
        ConfigCommand::Show => show(resolver, path),
        ConfigCommand::SetKey(args) => set_key(args, resolver, path),
        ConfigCommand::Select(args) => select(args, resolver, path),
    }
}

fn show(resolver: &ConfigResolver, path: &Path) -> Result<CommandResult, CliError> {
    let stored = resolver.stored()?;
    let resolved = resolver.load();
    respond(&stored, &resolved, path, Vec::new())
}

fn set_key(args: &SetKeyArgs, resolver: &ConfigResolver, path: &Path) -> Result<CommandResult, CliError> {
    if args.api_key.is_none() && args.base_url.is_none() {
        return Err(CliError::Command(String::from(
            "pass --api-key and/or --base-url",
        )));
    }

    let mut settings = resolver.stored()?;
    settings.providers.insert(
        args.provider,
        ProviderCredentials {
            api_key: args.api_key.clone().unwrap_or_default(),
            base_url: args.base_url.clone().unwrap_or_default(),
        },
    );
    let resolved = resolver.save(settings)?;
    let stored = resolver.stored()?;

    let mut warnings = Vec::new();
    if !stored.has_valid_credentials(args.provider) {
        warnings.push(format!(
            "{} still lacks a required credential and will be skipped",
            args.provider
        ));
    }
    respond(&stored, &resolved, path, warnings)
}

fn select(args: &SelectArgs, resolver: &ConfigResolver, path: &Path) -> Result<CommandResult, CliError> {
    if args.primary.is_none() && args.fallback.is_none() && !args.clear_fallback {
        return Err(CliError::Command(String::from(
            "pass --primary, --fallback, or --clear-fallback",
        )));
    }

    let mut settings = resolver.stored()?;
    if let Some(primary) = args.primary {
        settings.primary = Some(primary);
    }
    if let Some(fallback) = args.fallback {
        settings.fallback = Some(fallback);
    }
    if args.clear_fallback {
        settings.fallback = None;
    }

    let mut warnings = Vec::new();
    for provider in [settings.primary, settings.fallback].into_iter().flatten() {
        if !settings.has_valid_credentials(provider) {
            warnings.push(format!(
                "{provider} has no valid credentials and will be left out of the chain"
            ));
        }
    }
    if settings.primary.is_some() && settings.primary == settings.fallback {
        warnings.push(String::from("primary and fallback are the same provider"));
    }

    let resolved = resolver.save(settings)?;
    let stored = resolver.stored()?;
    respond(&stored, &resolved, path, warnings)
}

fn respond(
    stored: &Settings,
    resolved: &Settings,
    path: &Path,
    warnings: Vec<String>,
) -> Result<CommandResult, CliError> {
    let providers = stored
        .providers
        .iter()
        .map(|(provider, credentials)| {
            (
                *provider,
                CredentialView {
                    api_key: redact(&credentials.api_key),
                    base_url: credentials.base_url.clone(),
                    valid: stored.has_valid_credentials(*provider),
                },
            )
        })
        .collect();

    let view = SettingsView {
        path: path.display().to_string(),
        primary: stored.primary,
        fallback: stored.fallback,
        resolved_primary: resolved.primary,
        resolved_fallback: resolved.fallback,
        providers,
    };

    // Same planner dispatch uses, so credential filtering and weights apply.
    let preview = Query::new("chain preview", QueryType::Web)?;
    let chain = OrderingPolicy::default().chain(resolved, &preview);
    let mut result = CommandResult::ok(serde_json::to_value(view)?, chain);
    for warning in warnings {
        result = result.with_warning(warning);
    }
    Ok(result)
}
