//! Binary entry point: load `.env`, configure logging, dispatch to the CLI.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subsidy_crawler::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "subsidy_crawler=debug"
    } else {
        "subsidy_crawler=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
