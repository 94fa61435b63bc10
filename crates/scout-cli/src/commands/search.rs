use scout_core::{CancelToken, Dispatcher, Query};

use crate::cli::SearchArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &SearchArgs, dispatcher: &Dispatcher) -> Result<CommandResult, CliError> {
    let query = build_query(args)?;

    // Ctrl-C stops the chain walk at the next attempt or backoff boundary.
    let cancel = CancelToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });
    let outcome = dispatcher.dispatch_detailed(&query, &cancel).await;
    watcher.abort();

    let success = outcome?;
    let data = serde_json::to_value(&success.result)?;
    Ok(CommandResult::ok(data, success.chain)
        .with_selected(success.provider)
        .with_failures(success.failures)
        .with_warnings(success.warnings)
        .with_latency(success.latency_ms))
}

fn build_query(args: &SearchArgs) -> Result<Query, CliError> {
    let mut query = Query::new(args.query.trim(), args.query_type)?.with_max_results(args.limit)?;
    if let Some(date_range) = args.date_range {
        query = query.with_date_range(date_range);
    }
    if let Some(region) = args.region.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        query = query.with_region(region);
    }
    if let Some(language) = args.language.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        query = query.with_language(language);
    }
    if let Some(safe_search) = args.safe_search {
        query = query.with_safe_search(safe_search);
    }
    if let Some(provider) = args.provider {
        query = query.with_provider(provider);
    }
    Ok(query)
}
