// src/error.rs
// =============================================================================
// The ways a single input line can fail to come back "UP".
//
// Every variant except InputRead is turned into a result line and never
// stops the program. InputRead ends the scan of the input stream, but probes
// that were already launched still finish and print their results.
//
// Rust concepts:
// - thiserror: derive std::error::Error and Display from attributes
// - #[source]: keeps the underlying io::Error reachable through .source()
// =============================================================================

use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckError {
    /// The line is not a syntactically valid request URI (no network I/O happened)
    #[error("invalid URL")]
    InvalidUrl,

    /// The request/response cycle did not finish within the configured timeout
    #[error("timeout after {}", format_duration(*.0))]
    Timeout(Duration),

    /// Connection refused, DNS failure, TLS failure, malformed response, ...
    #[error("{0}")]
    Transport(String),

    /// Scanning the input stream itself failed
    #[error("reading input: {0}")]
    InputRead(#[source] io::Error),
}

// Formats a duration as "1s", "1m30s", "1h0m0s", "1.5s" or "250ms".
//
// Once a larger unit is printed every smaller one follows, and there are
// no spaces. Fractions keep only their significant digits.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    match nanos {
        0 => return "0s".to_string(),
        1..=999 => return format!("{}ns", nanos),
        1_000..=999_999 => return format!("{}\u{b5}s", decimal(nanos, 1_000)),
        1_000_000..=999_999_999 => return format!("{}ms", decimal(nanos, 1_000_000)),
        _ => {}
    }

    let total = d.as_secs();
    let (hours, minutes, secs) = (total / 3600, total % 3600 / 60, total % 60);
    let secs = decimal(
        u128::from(secs) * 1_000_000_000 + u128::from(d.subsec_nanos()),
        1_000_000_000,
    );

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&secs);
    out.push('s');
    out
}

// `value / unit` written with as many decimals as needed, e.g. 1500/1000 -> "1.5"
fn decimal(value: u128, unit: u128) -> String {
    let (whole, frac) = (value / unit, value % unit);
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}
