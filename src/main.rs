use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use erp_catalog_sync::compare::Comparison;
use erp_catalog_sync::config;
use erp_catalog_sync::io::erp_api::ErpClient;
use erp_catalog_sync::merge::{MergeOptions, PurchasingSource, Side};
use erp_catalog_sync::report::LogNotifier;
use erp_catalog_sync::{Result, SyncError, sync};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| SyncError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge(args) => execute_merge(args),
        Command::Apply(args) => execute_apply(args),
        Command::Run(args) => execute_run(args),
        Command::Stock(args) => execute_stock(args),
    }
}

fn execute_merge(args: MergeArgs) -> Result<()> {
    for input in [&args.system_a, &args.system_b] {
        if !input.exists() {
            return Err(SyncError::MissingInput(input.clone()));
        }
    }

    let options = MergeOptions {
        authoritative: args.authoritative.into(),
        comparison: args.comparison.into(),
        purchasing: args.purchasing.into(),
    };
    sync::reconcile_files(&args.system_a, &args.system_b, &args.output, &options)?;
    Ok(())
}

fn execute_apply(args: ApplyArgs) -> Result<()> {
    let config = config::load_config(&args.config)?;
    let delta_dir = args.delta.unwrap_or_else(|| config.output_dir.clone());

    let api_a = ErpClient::from_config(&config.system_a)?;
    let api_b = ErpClient::from_config(&config.system_b)?;
    let report = sync::apply_saved_delta(&delta_dir, &api_a, &api_b, &LogNotifier)?;
    info!(failures = report.failure_count(), "apply finished");
    Ok(())
}

fn execute_run(args: RunArgs) -> Result<()> {
    let config = config::load_config(&args.config)?;
    let outcome = sync::run(&config, args.apply)?;
    if outcome.applied.is_none() {
        info!(output = %config.output_dir.display(), "dry run, delta files left for review");
    }
    Ok(())
}

fn execute_stock(args: StockArgs) -> Result<()> {
    let config = config::load_config(&args.config)?;
    let synced = sync::run_stock(&config)?;
    info!(lines = synced.entries.len(), "warehouse sync finished");
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile product catalogs between two ERP company accounts."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge two catalog dumps into delta files.
    Merge(MergeArgs),
    /// Push previously written delta files to both systems.
    Apply(ApplyArgs),
    /// Merge the configured catalogs and optionally apply the result.
    Run(RunArgs),
    /// Copy warehouse stock from one system to the other.
    Stock(StockArgs),
}

#[derive(clap::Args)]
struct MergeArgs {
    /// Catalog dump of System A.
    #[arg(long)]
    system_a: PathBuf,

    /// Catalog dump of System B.
    #[arg(long)]
    system_b: PathBuf,

    /// Directory receiving the delta files.
    #[arg(long, default_value = "delta")]
    output: PathBuf,

    /// System whose values win on conflicts.
    #[arg(long, value_enum, default_value_t = SideArg::A)]
    authoritative: SideArg,

    /// List matching used when comparing field values.
    #[arg(long, value_enum, default_value_t = ComparisonArg::Strict)]
    comparison: ComparisonArg,

    /// Source of `purchasing` on the authoritative system's updates.
    #[arg(long, value_enum, default_value_t = PurchasingArg::OwnSystem)]
    purchasing: PurchasingArg,
}

#[derive(clap::Args)]
struct ApplyArgs {
    /// Run configuration (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Directory holding the delta files; defaults to the configured output.
    #[arg(long)]
    delta: Option<PathBuf>,
}

#[derive(clap::Args)]
struct StockArgs {
    /// Run configuration (TOML) with a `[stock]` section.
    #[arg(long)]
    config: PathBuf,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Run configuration (TOML).
    #[arg(long)]
    config: PathBuf,

    /// Send the computed delta to both systems instead of only writing it.
    #[arg(long)]
    apply: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SideArg {
    A,
    B,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::A => Side::A,
            SideArg::B => Side::B,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ComparisonArg {
    Strict,
    Loose,
}

impl From<ComparisonArg> for Comparison {
    fn from(kind: ComparisonArg) -> Self {
        match kind {
            ComparisonArg::Strict => Comparison::Strict,
            ComparisonArg::Loose => Comparison::Loose,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PurchasingArg {
    OwnSystem,
    Subordinate,
}

impl From<PurchasingArg> for PurchasingSource {
    fn from(kind: PurchasingArg) -> Self {
        match kind {
            PurchasingArg::OwnSystem => PurchasingSource::OwnSystem,
            PurchasingArg::Subordinate => PurchasingSource::Subordinate,
        }
    }
}
