use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use journalrec::{BiorxivFetcher, JournalRecConfig, QueryContext, run_query};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "journalrec",
    version,
    about = "Find the papers and journals closest to a bioRxiv preprint"
)]
struct Cli {
    /// Pipeline configuration file
    #[arg(long, short, env = "JOURNALREC_CONFIG", default_value = "journalrec.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one query and print the JSON response
    Query {
        /// DOI of the preprint, bare or as a doi.org URL
        doi: String,

        /// Print compact JSON on one line
        #[arg(long)]
        compact: bool,
    },
    /// Load every artifact and report corpus sizes, then exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = JournalRecConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let fetch_cfg = cfg.fetch.clone();
    let ctx = tokio::task::spawn_blocking(move || QueryContext::load(&cfg))
        .await
        .context("loader task panicked")??;
    let ctx = Arc::new(ctx);

    match cli.command {
        Command::Check => {
            println!("{}", serde_json::to_string_pretty(&ctx.stats())?);
        }
        Command::Query { doi, compact } => {
            let fetcher = BiorxivFetcher::new(&fetch_cfg)?;
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_signal.cancel();
                }
            });

            let response = run_query(&ctx, &fetcher, &doi, ctx.deadline(), cancel)
                .await
                .with_context(|| format!("query for {doi} failed"))?;
            let json = if compact {
                serde_json::to_string(&response)?
            } else {
                serde_json::to_string_pretty(&response)?
            };
            println!("{json}");
        }
    }
    Ok(())
}
