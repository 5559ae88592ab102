//! ScreenLab CLI — replay a recorded feed through the selection engine.
//!
//! Commands:
//! - `replay` — feed daily observation batches and point-in-time fundamentals
//!   through the engine and print every rebalance
//! - `config` — print the effective configuration as TOML

mod feed;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use screenlab_core::{InstrumentId, ScreenerConfig, SelectionEngine, UniverseChange};

#[derive(Parser)]
#[command(
    name = "screenlab",
    about = "ScreenLab CLI — coarse/fine universe selection"
)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay observation and fundamentals CSV files day by day.
    Replay {
        /// Observations CSV: symbol,date,adjusted_price,dollar_volume,has_fundamental_data
        #[arg(long)]
        observations: PathBuf,

        /// Fundamentals CSV: symbol,date,country_id,primary_exchange_id,industry_template_code,
        /// ipo_date,basic_average_shares_3m,basic_eps_12m,pe_ratio,ev_to_ebitda,forward_roa
        #[arg(long)]
        fundamentals: PathBuf,

        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print rebalances as JSON lines instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Config {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Replay {
            observations,
            fundamentals,
            config,
            json,
        } => run_replay(&observations, &fundamentals, config.as_deref(), json),
        Commands::Config { config } => run_config(config.as_deref()),
    }
}

/// Initialise the `tracing` subscriber. Logs go to stderr so stdout stays
/// parseable.
fn init_logging(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("screenlab=info,screenlab_core=info"));

    if json {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<ScreenerConfig> {
    match path {
        Some(path) => ScreenerConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ScreenerConfig::default()),
    }
}

fn run_config(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// One rebalance, as printed by `replay`.
#[derive(Debug, Serialize)]
struct RebalanceEvent {
    date: NaiveDate,
    selected: Vec<InstrumentId>,
    added: Vec<InstrumentId>,
    removed: Vec<InstrumentId>,
}

impl RebalanceEvent {
    fn render_text(&self) -> String {
        let join = |ids: &[InstrumentId]| {
            ids.iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        };
        format!(
            "{}  selected[{}]: {}\n            added: {}\n          removed: {}",
            self.date,
            self.selected.len(),
            join(&self.selected),
            join(&self.added),
            join(&self.removed),
        )
    }
}

fn run_replay(
    observations: &Path,
    fundamentals: &Path,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let fingerprint = config.fingerprint()?;
    let batches = feed::load_observations(observations)?;
    let source = feed::load_fundamentals(fundamentals)?;
    info!(
        config = %fingerprint,
        days = batches.len(),
        fundamental_symbols = source.symbols(),
        "starting replay"
    );

    let mut engine = SelectionEngine::new(config)?;
    let mut holdings: Vec<InstrumentId> = Vec::new();
    let mut rebalances = 0usize;

    for (date, batch) in &batches {
        let change = engine
            .run_cycle(*date, batch, &source)
            .with_context(|| format!("selection failed on {date}"))?;
        let diff = change.diff(&holdings);
        let UniverseChange::Rebalanced(selected) = change else {
            continue;
        };
        rebalances += 1;

        let event = RebalanceEvent {
            date: *date,
            selected,
            added: diff.added,
            removed: diff.removed,
        };
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("{}", event.render_text());
        }
        holdings = event.selected;
    }

    info!(
        days = batches.len(),
        rebalances,
        tracked = engine.coarse().store().len(),
        final_holdings = holdings.len(),
        "replay complete"
    );
    Ok(())
}
