//! Synod - Multi-Expert Task Orchestration
//!
//! CLI entry point. The orchestration engine lives in `synod-core`; this
//! binary only wires providers from the environment, resolves the current
//! task pointer, and maps fatal errors to exit codes.

#![forbid(unsafe_code)]

use clap::Parser;
use synod_core::error::format_error_for_cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "synod=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = cli::Cli::parse();

    if let Err(e) = cli::run(cli).await {
        eprintln!("{}", format_error_for_cli(&e));
        std::process::exit(e.exit_code());
    }
}
