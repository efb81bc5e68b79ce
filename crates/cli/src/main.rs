use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catsync_cli::args::Args;
use catsync_cli::config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing (stderr; stdout carries the verdict) ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Arguments (exits non-zero on usage errors) ---
    let args = Args::parse();

    // --- Configuration ---
    let config = CliConfig::from_env();
    tracing::info!(
        entity_id = args.entity_id,
        category = args.category,
        wait_seconds = args.wait_seconds,
        max_retries = args.max_retries,
        "Starting validation"
    );

    let result = catsync_cli::run(&config, &args.request()).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
