mod config;
mod providers;
mod search;

use std::sync::Arc;
use std::time::Duration;

use scout_core::{
    ConfigResolver, DispatchOptions, DispatcherBuilder, ProviderFailure, ProviderId,
    RetryExecutor, RetryPolicy,
};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::{Report, ReportMeta};
use crate::store::{default_config_path, JsonFileStore};

#[derive(Debug)]
pub struct CommandResult {
    pub data: Value,
    pub selected_provider: Option<ProviderId>,
    pub provider_chain: Vec<ProviderId>,
    pub warnings: Vec<String>,
    pub failures: Vec<ProviderFailure>,
    pub latency_ms: u64,
}

impl CommandResult {
    pub fn ok(data: Value, provider_chain: Vec<ProviderId>) -> Self {
        Self {
            data,
            selected_provider: None,
            provider_chain,
            warnings: Vec::new(),
            failures: Vec::new(),
            latency_ms: 0,
        }
    }

    pub fn with_selected(mut self, provider: ProviderId) -> Self {
        self.selected_provider = Some(provider);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_failures(mut self, failures: Vec<ProviderFailure>) -> Self {
        self.failures.extend(failures);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Report, CliError> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    debug!(path = %config_path.display(), "using settings file");

    let store = JsonFileStore::new(&config_path);
    let resolver = Arc::new(ConfigResolver::new(Arc::new(store)));
    let dispatcher = DispatcherBuilder::new(Arc::clone(&resolver))
        .retry(RetryExecutor::new(RetryPolicy::with_max_attempts(
            cli.max_attempts,
        )))
        .options(DispatchOptions {
            deadline: cli.timeout_ms.map(Duration::from_millis),
        })
        .build();

    let CommandResult {
        data,
        selected_provider,
        provider_chain,
        warnings,
        failures,
        latency_ms,
    } = match &cli.command {
        Command::Search(args) => search::run(args, &dispatcher).await?,
        Command::Providers(args) => providers::run(args, &dispatcher).await?,
        Command::Config(args) => config::run(args, &resolver, &config_path)?,
    };

    Ok(Report {
        data,
        meta: ReportMeta {
            request_id: Uuid::new_v4(),
            selected_provider,
            provider_chain,
            warnings,
            failures,
            latency_ms,
        },
    })
}
