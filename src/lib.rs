// src/lib.rs
// =============================================================================
// site-status: read URLs, GET each one concurrently, print whether it's UP.
//
// The binary (src/main.rs) only parses flags and wires stdin/stdout to the
// pieces exported here:
// - checker: validate a line, build the client, probe one URL
// - dispatch: spawn one probe per line and serialize their output
// - error: the ways a line can fail
// =============================================================================

pub mod checker;
pub mod dispatch;
pub mod error;

#[cfg(test)]
mod testutil;

pub use checker::{is_valid_url, probe, ProbeResult, Prober, TransportOptions};
pub use dispatch::{dispatch_all, DispatchReport, Dispatcher, OutputFormat, Sink};
pub use error::CheckError;
