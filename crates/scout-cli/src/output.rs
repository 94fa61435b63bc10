use scout_core::{ProviderFailure, ProviderId};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::CliError;

/// Top-level JSON document written to stdout.
#[derive(Debug, Serialize)]
pub struct Report {
    pub data: Value,
    pub meta: ReportMeta,
}

#[derive(Debug, Serialize)]
pub struct ReportMeta {
    pub request_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_provider: Option<ProviderId>,
    pub provider_chain: Vec<ProviderId>,
    pub warnings: Vec<String>,
    pub failures: Vec<ProviderFailure>,
    pub latency_ms: u64,
}

pub fn render(report: &Report, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{payload}");
    Ok(())
}
