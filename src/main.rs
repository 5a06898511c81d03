// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr, so stdout only ever holds domains)
// 3. Open the output file and build the shared scan context
// 4. Scan one URL directly, or hand a URL file to the worker pool
// 5. Exit with proper code (0 = done, 1 = usage error, 2 = startup error)
// =============================================================================

mod cli;   // src/cli.rs - command-line parsing
mod csp;   // src/csp/ - header parsing and the domain registry
mod scan;  // src/scan/ - fetching, workers, output

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Source};
use scan::{OutputSink, ScanContext};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = scan finished
//   Ok(1) = nothing to scan (usage printed)
//   Err   = the scan couldn't start
async fn run(cli: Cli) -> Result<i32> {
    let Some(source) = cli.source() else {
        eprintln!("Either -f <file> or -u <url> is required.\n");
        Cli::command().print_help()?;
        return Ok(1);
    };

    let sink = match &cli.output {
        Some(path) => OutputSink::create(path)?,
        None => OutputSink::stdout(),
    };
    let ctx = Arc::new(ScanContext::new(cli.scan_config(), sink)?);

    match source {
        Source::Url(url) => {
            scan::scan_target(&ctx, &url).await;
        }
        Source::File(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("failed to open input file {}", path.display()))?;

            info!(
                file = %path.display(),
                workers = ctx.config.workers,
                delay = ?ctx.config.delay,
                "starting scan"
            );
            scan::run_workers(Arc::clone(&ctx), BufReader::new(file)).await;
        }
    }

    ctx.sink.flush().context("failed to flush output")?;
    info!(
        summary = %ctx.stats.summary(),
        unique_domains = ctx.registry.count(),
        "scan finished"
    );

    Ok(0)
}

// RUST_LOG wins if set; otherwise -v flags pick the level
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}
