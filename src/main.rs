//! ydisk-mirror — mirror the video tree of a public Yandex Disk folder
//! into a private Disk.
//!
//! Discovery linearizes the public folder depth-first, a markdown
//! checklist ledger records per-file progress, and each file is moved
//! download-then-upload through a local staging directory. Interrupt the
//! tool at any point and rerun it; finished files are skipped and the
//! interrupted file picks up from its recorded state.

#![warn(clippy::all)]

mod cli;
mod config;
mod discover;
mod ledger;
mod pipeline;
mod relpath;
mod run;
mod yadisk;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::Config;
use ledger::Status;
use pipeline::Pipeline;

const EXIT_INVALID_ARGS: i32 = 1;
const EXIT_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let filter = if cli.verbose {
        "ydisk_mirror=debug"
    } else {
        "ydisk_mirror=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    let config = match Config::from_cli(cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            std::process::exit(EXIT_INVALID_ARGS);
        }
    };

    if let Err(e) = try_main(config).await {
        tracing::error!("{e:#}");
        std::process::exit(EXIT_ERROR);
    }
}

async fn try_main(config: Config) -> anyhow::Result<()> {
    let client = yadisk::DiskClient::new(&config.source_url, config.oauth_token.as_deref())?;

    tracing::info!(source = %config.source_url, "discovering source tree");
    let mut items = discover::linearize(&client, "/").await?;
    if let Some(filter) = &config.folder_filter {
        items.retain(|item| item.relative_path.starts_with(filter));
        tracing::info!(folder = %filter, count = items.len(), "applied folder filter");
    }
    tracing::info!(count = items.len(), "media files discovered");

    let mut ledger = ledger::Ledger::load(&config.state_file)?;
    ledger.record_discovered(items.iter().map(|item| &item.relative_path))?;

    if config.list_only {
        for (key, status) in ledger.entries() {
            let marker = match status {
                Status::Pending => ' ',
                Status::LocalOnly => 'p',
                Status::Done => 'x',
            };
            println!("[{marker}] {key}");
        }
        return Ok(());
    }

    if config.test_single {
        // Single-file trial run: first item still awaiting transfer.
        items.retain(|item| ledger.status_of(&item.relative_path) != Status::Done);
        items.truncate(1);
        tracing::info!("test mode: transferring at most one file");
    }

    let destination = config
        .destination
        .as_deref()
        .context("no destination path configured")?;
    let pipeline = Pipeline::new(&client, config.cache_dir.clone(), destination);
    let summary = run::run(&pipeline, &items, &mut ledger).await?;
    tracing::info!(
        transferred = summary.transferred,
        skipped = summary.skipped,
        "mirror up to date"
    );
    Ok(())
}
