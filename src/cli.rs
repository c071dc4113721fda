// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things). Every flag can also be
// set through an environment variable; a flag on the command line wins.
// =============================================================================

use clap::Parser;
use site_status::checker::{TransportOptions, DEFAULT_TIMEOUT_SECS};
use site_status::OutputFormat;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "site-status",
    version,
    about = "Check whether websites are up",
    long_about = "site-status reads one URL per line (from a file or stdin), sends a GET \
                  request to each of them concurrently and prints one result line per \
                  input line: UP <status>, DOWN <error> or invalid URL."
)]
pub struct Cli {
    /// File with one URL per line. Reads stdin when omitted or "-"
    pub input: Option<PathBuf>,

    /// Accept invalid TLS certificates (self-signed, expired, wrong host)
    #[arg(long, alias = "ignore-certs", env = "SITE_STATUS_INSECURE")]
    pub insecure: bool,

    /// Don't follow redirects; report the 3xx response itself
    #[arg(long, alias = "noRedirects", env = "SITE_STATUS_NO_REDIRECTS")]
    pub no_redirects: bool,

    /// Timeout in seconds for each URL (connect, send and read the whole response)
    #[arg(
        long,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        env = "SITE_STATUS_TIMEOUT"
    )]
    pub timeout: u64,

    /// Maximum number of requests in flight at once (default: no limit)
    #[arg(
        long,
        value_parser = clap::value_parser!(u64).range(1..),
        env = "SITE_STATUS_MAX_CONCURRENT"
    )]
    pub max_concurrent: Option<u64>,

    /// Print one JSON object per line instead of plain text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            skip_certificate_verification: self.insecure,
            follow_redirects: !self.no_redirects,
            timeout: Duration::from_secs(self.timeout),
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    pub fn max_concurrent(&self) -> Option<usize> {
        self.max_concurrent.map(|n| n as usize)
    }

    // None means stdin
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.as_os_str() != "-")
    }
}
