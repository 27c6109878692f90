mod cli;
mod engine;
mod model;
mod orchestrator;
mod storage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "analyticore_cli=debug"
    } else {
        "analyticore_cli=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present, so API_BASE_URL can live there.
    let _ = dotenvy::dotenv();

    let args = cli::Cli::parse();
    let is_silent = args.silent;
    let is_non_tui = args.is_non_tui();

    // Log lines would tear up the alternate screen, so the TUI runs without a subscriber.
    if is_non_tui && !is_silent {
        init_tracing(args.verbose);
    }

    match cli::run(args).await {
        Ok(()) => {
            if is_non_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            if is_silent {
                println!("{}", e);
                std::process::exit(1);
            } else {
                Err(e)
            }
        }
    }
}
