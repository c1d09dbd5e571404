//! CLI entry point (spec.md "Deliberately out of scope": "CLI argument
//! parsing... deployment glue" — kept minimal, just enough to invoke a
//! run). Three subcommands: `run`, `backfill`, `quota`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::discovery::{NullProvider, NullRssProvider, Seed};
use crate::orchestrator::CrawlOrchestrator;
use crate::repository::Repository;
use crate::run_id::resolve_run_id;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "subsidy-crawler")]
#[command(about = "Incremental, budget-bounded crawler for government subsidy program pages")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging (equivalent to RUST_LOG=subsidy_crawler=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Seed file path (YAML; spec.md §6 "Seed file")
    #[arg(short, long, global = true, default_value = "seed.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full crawl cycle: RSS, crawl, backfill, discovery lanes, then
    /// emit the run summary.
    Run,

    /// Run the backfill/repair ladder directly, outside the normal lane
    /// sequence — useful for repairing a single stuck URL ad hoc.
    Backfill {
        /// Repair exactly this URL instead of pulling a batch from `pages`.
        url: Option<String>,
    },

    /// Inspect or set a monthly API quota (spec.md §4.7 "Budget Gate").
    Quota {
        /// Named API (e.g. "tavily").
        api: String,

        /// Set the monthly limit instead of just printing current usage.
        #[arg(long)]
        set: Option<i32>,
    },
}

/// Check if verbose mode is enabled (for early logging setup, before
/// `Cli::parse()` has run).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let repo = Repository::connect(&settings.database_url)?;

    match cli.command {
        Commands::Run => cmd_run(&settings, &repo, &cli.config).await,
        Commands::Backfill { url } => cmd_backfill(&settings, &repo, url.as_deref()).await,
        Commands::Quota { api, set } => cmd_quota(&repo, &api, set).await,
    }
}

async fn load_seed(path: &PathBuf) -> anyhow::Result<Seed> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read seed file {}: {e}", path.display()))?;
    Ok(Seed::from_yaml(&text)?)
}

async fn cmd_run(settings: &Settings, repo: &Repository, seed_path: &PathBuf) -> anyhow::Result<()> {
    let seed = load_seed(seed_path).await?;
    let run_id = resolve_run_id();
    let orchestrator = CrawlOrchestrator::new(
        settings,
        repo.clone(),
        seed,
        Arc::new(NullProvider),
        Arc::new(NullRssProvider),
        run_id,
    );
    orchestrator.run().await?;
    Ok(())
}

async fn cmd_backfill(
    settings: &Settings,
    repo: &Repository,
    url: Option<&str>,
) -> anyhow::Result<()> {
    use crate::backfill::run_ladder;
    use crate::fetcher::{Fetcher, HostTimeouts, KNOWN_SLOW_HOSTS};

    repo.ensure_schema().await?;
    let fetcher = Fetcher::with_timeouts(
        settings.connect_timeout,
        HostTimeouts::from_env(settings.read_timeout, KNOWN_SLOW_HOSTS),
        settings.force_refresh,
    );
    let discovery: Arc<dyn crate::discovery::DiscoveryProvider> = Arc::new(NullProvider);

    let targets: Vec<String> = match url {
        Some(u) => vec![u.to_string()],
        None => {
            let limit = if settings.single_backfill_one { 1 } else { 20 };
            repo.deficient_pages(limit).await?
        }
    };

    for target in targets {
        let result = run_ladder(
            &fetcher,
            &discovery,
            &target,
            true,
            settings.single_large_bytes,
            settings.single_stage1_read_timeout,
            settings.head_connect_timeout,
            settings.head_read_timeout,
        )
        .await;

        match result.page {
            Some(page) => {
                let changed = repo.upsert_page(&page).await?;
                println!("{target}: {:?} (changed={changed}) — {}", result.outcome, result.detail);
            }
            None => println!("{target}: ng — {}", result.detail),
        }
    }

    Ok(())
}

async fn cmd_quota(repo: &Repository, api: &str, set: Option<i32>) -> anyhow::Result<()> {
    use crate::budget::BudgetGate;

    repo.ensure_schema().await?;
    let budget = BudgetGate::new(repo.clone());

    if let Some(limit) = set {
        budget.set_monthly_limit(api, limit).await?;
    }

    let usage = budget.usage(api).await?;
    println!("{api}: used={} limit={}", usage.used, usage.quota_limit);
    Ok(())
}
