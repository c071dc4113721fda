// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing) on stderr
// 2. Parse command-line arguments using clap
// 3. Hand the input stream and stdout to the dispatcher
// 4. Exit with proper code (0 = every line handled, 2 = input problem)
//
// DOWN sites and invalid URLs are normal results, they don't change the
// exit code.
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use site_status::{Dispatcher, Sink};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout only carries result lines
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run().await {
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
//   Ok(0) = every input line got a result
//   Ok(2) = reading the input failed part way (earlier lines still reported)
//   Err   = could not start at all
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let opts = cli.transport_options();

    let dispatcher = Dispatcher::new(&opts)
        .context("building HTTP client")?
        .with_format(cli.output_format())
        .with_max_concurrent(cli.max_concurrent());

    let input = open_input(&cli).await?;
    let sink = Arc::new(Sink::new(std::io::stdout()));

    let report = dispatcher.run(input, sink).await;

    if let Some(err) = report.read_error {
        eprintln!("{}", err);
        return Ok(2);
    }

    Ok(0)
}

// stdin, or the file named on the command line
async fn open_input(cli: &Cli) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match cli.input_path() {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}
