//! CLI argument definitions for scout.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `search` | Dispatch a query through the provider chain |
//! | `providers` | Show the planned chain and provider metadata |
//! | `config show` | Print stored settings with keys redacted |
//! | `config set-key` | Store credentials for one provider |
//! | `config select` | Choose the primary and fallback providers |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | platform config dir | Settings file (env `SCOUT_CONFIG`) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | none | Wall-clock budget for one dispatch |
//! | `--max-attempts` | `3` | Calls per provider before falling back |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! scout config set-key alpha --api-key sk-123
//! scout config select --primary alpha --fallback beta
//! scout search "rust async runtimes" --type news --limit 5 --pretty
//! scout search "ferris" --provider gamma
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use scout_core::{DateRange, ProviderId, QueryType, SafeSearch};

/// Multi-provider search with retry and fallback.
#[derive(Debug, Parser)]
#[command(
    name = "scout",
    author,
    version,
    about = "Multi-provider search with retry and fallback",
    long_about = "scout sends a query to one of several interchangeable search providers. \
Transient upstream failures are retried with exponential backoff; a provider that stays \
unusable is skipped in favour of the next one in the chain. Pass --provider to pin a \
single provider and disable fallback."
)]
pub struct Cli {
    /// Settings file holding provider credentials and selection.
    #[arg(long, global = true, env = "SCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Wall-clock budget for the whole dispatch in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Calls per provider, including the first, before moving down the chain.
    #[arg(long, global = true, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: u32,

    /// Emit debug logs on stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a search query.
    ///
    /// # Examples
    ///
    ///   scout search "tokio select"
    ///   scout search "eclipse" --type images --limit 20
    Search(SearchArgs),

    /// Show provider metadata, the planned chain, and optional health probes.
    Providers(ProvidersArgs),

    /// Inspect or change stored settings.
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-form query text.
    pub query: String,

    /// Search vertical: web, news, or images.
    #[arg(long = "type", default_value = "web")]
    pub query_type: QueryType,

    /// Maximum number of results (1-50).
    #[arg(long, default_value_t = scout_core::query::DEFAULT_RESULTS)]
    pub limit: usize,

    /// Restrict results by age: day, week, month, or year.
    #[arg(long)]
    pub date_range: Option<DateRange>,

    /// Region or market code, e.g. `us` or `de`.
    #[arg(long)]
    pub region: Option<String>,

    /// Result language code, e.g. `en`.
    #[arg(long)]
    pub language: Option<String>,

    /// Safe search level: off, moderate, or strict.
    #[arg(long)]
    pub safe_search: Option<SafeSearch>,

    /// Pin a single provider; disables fallback.
    #[arg(long)]
    pub provider: Option<ProviderId>,
}

#[derive(Debug, Args)]
pub struct ProvidersArgs {
    /// Query type used to preview the chain.
    #[arg(long = "type", default_value = "web")]
    pub query_type: QueryType,

    /// Probe every configured provider.
    #[arg(long, default_value_t = false)]
    pub health: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print stored and resolved settings. API keys are redacted.
    Show,

    /// Store credentials for a provider. Omitted fields keep their stored value.
    SetKey(SetKeyArgs),

    /// Choose the primary and fallback providers.
    Select(SelectArgs),
}

#[derive(Debug, Args)]
pub struct SetKeyArgs {
    pub provider: ProviderId,

    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Debug, Args)]
pub struct SelectArgs {
    #[arg(long)]
    pub primary: Option<ProviderId>,

    #[arg(long, conflicts_with = "clear_fallback")]
    pub fallback: Option<ProviderId>,

    /// Remove the stored fallback.
    #[arg(long, default_value_t = false)]
    pub clear_fallback: bool,
}
