// src/checker/http.rs
// =============================================================================
// This module checks if a site is up by making one HTTP GET request.
//
// Key functionality:
// - Sends exactly one GET (no HEAD, no retries)
// - Reads and discards the whole body so the connection can be reused
// - Any HTTP status, even 404 or 500, counts as UP: the server answered
// - Only transport failures count as DOWN, and timeouts are told apart
//   from every other failure
//
// Rust concepts:
// - async/await: For network I/O
// - Result<T, E>: Failures are values we turn into result text, never panics
// - Error::source(): Walking the chain of "caused by" errors
// =============================================================================

use crate::checker::transport::{build_client, TransportOptions};
use crate::error::CheckError;
use hyper::ext::ReasonPhrase;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::time::Duration;
use tracing::debug;

// What happened to one input line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The server sent back an HTTP response (any status code)
    Up,
    /// The request failed for a reason other than a timeout
    Down,
    /// The request did not finish within the timeout
    Timeout,
    /// The line was not a URL, nothing was sent
    Invalid,
}

// The result of checking a single input line
//
// `status_text` is exactly what follows the line in the text output:
// "UP 200 OK", "DOWN timeout after 15s", "DOWN <error>" or "invalid URL".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    /// The trimmed input line
    #[serde(rename = "url")]
    pub source_line: String,
    pub outcome: Outcome,
    #[serde(rename = "result")]
    pub status_text: String,
}

impl ProbeResult {
    /// Result for a line that failed validation
    pub fn invalid(source_line: impl Into<String>) -> Self {
        Self::from_check(source_line, Err(CheckError::InvalidUrl))
    }

    // Converts the outcome of one check into its printable form
    pub fn from_check(source_line: impl Into<String>, checked: Result<String, CheckError>) -> Self {
        let (outcome, status_text) = match checked {
            Ok(status_line) => (Outcome::Up, format!("UP {}", status_line)),
            Err(CheckError::InvalidUrl) => (Outcome::Invalid, CheckError::InvalidUrl.to_string()),
            Err(e @ CheckError::Timeout(_)) => (Outcome::Timeout, format!("DOWN {}", e)),
            Err(e) => (Outcome::Down, format!("DOWN {}", e)),
        };

        Self {
            source_line: source_line.into(),
            outcome,
            status_text,
        }
    }

    /// `<line> <result>`, the plain text output format (no newline)
    pub fn to_line(&self) -> String {
        format!("{} {}", self.source_line, self.status_text)
    }

    pub fn is_up(&self) -> bool {
        self.outcome == Outcome::Up
    }
}

// Holds one configured client so many probes can share it.
//
// reqwest::Client is an Arc internally, so cloning a Prober is cheap and
// every clone reuses the same connection pool.
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
    timeout: Duration,
}

impl Prober {
    pub fn new(opts: &TransportOptions) -> reqwest::Result<Self> {
        Ok(Self {
            client: build_client(opts)?,
            timeout: opts.timeout,
        })
    }

    /// Checks `url` and returns the complete result for that line
    pub async fn check(&self, url: &str) -> ProbeResult {
        let checked = self.fetch_status(url).await;
        if let Err(e) = &checked {
            debug!(url, error = %e, "probe failed");
        }
        ProbeResult::from_check(url, checked)
    }

    // Sends the GET, drains the body and returns the status line
    async fn fetch_status(&self, url: &str) -> Result<String, CheckError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| categorize_error(&e, self.timeout))?;

        let status = response.status();
        // Only present when the server's phrase differs from the standard one
        let reason = response
            .extensions()
            .get::<ReasonPhrase>()
            .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned());

        // Read and throw away the body. A failure here (including running
        // out of time mid-body) still means the site is DOWN.
        while response
            .chunk()
            .await
            .map_err(|e| categorize_error(&e, self.timeout))?
            .is_some()
        {}

        Ok(status_line(status, reason.as_deref()))
    }
}

// Performs a single GET against `url` and describes the outcome.
//
// Builds its own client from `opts`. Never fails: every problem is folded
// into the returned text.
pub async fn probe(url: &str, opts: &TransportOptions) -> String {
    match Prober::new(opts) {
        Ok(prober) => prober.check(url).await.status_text,
        Err(e) => ProbeResult::from_check(url, Err(CheckError::Transport(describe_error(&e))))
            .status_text,
    }
}

// "200 OK", "301 Moved Permanently", or just "599" for codes with no name.
// A phrase sent by the server ("200 Alright") wins over the standard one.
fn status_line(status: StatusCode, reason: Option<&str>) -> String {
    let reason = reason
        .filter(|r| !r.is_empty())
        .or_else(|| status.canonical_reason());
    match reason {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

// Sorts a reqwest error into timeout vs. everything else.
//
// The timeout check comes first: a connect timeout can arrive wrapped
// inside a generic "error sending request" error.
fn categorize_error(error: &reqwest::Error, timeout: Duration) -> CheckError {
    if is_timeout(error) {
        CheckError::Timeout(timeout)
    } else {
        CheckError::Transport(describe_error(error))
    }
}

fn is_timeout(error: &reqwest::Error) -> bool {
    if error.is_timeout() {
        return true;
    }

    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        source = cause.source();
    }
    false
}

// Joins the error and its causes: "error sending request ...: tcp connect
// error: Connection refused (os error 111)". Causes whose text is already
// present are skipped so nothing is printed twice.
fn describe_error(error: &(dyn StdError + 'static)) -> String {
    let mut text = error.to_string();

    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !cause_text.is_empty() && !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }

    text
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is a 404 "UP"?
//    - The question this tool answers is "did the server respond?"
//    - A 404 or 500 is still a response from a live server
//    - Only failing to get any response at all is DOWN
//
// 2. What is .chunk()?
//    - Reads the next piece of the response body, or None at the end
//    - Looping until None drains the body without keeping it in memory
//
// 3. What is error.source()?
//    - Errors in Rust can wrap other errors ("caused by")
//    - .source() returns the wrapped error, if any
//    - Walking the chain finds the real cause (e.g. "Connection refused")
//
// 4. What is downcast_ref?
//    - source() gives us a &dyn Error (we don't know the concrete type)
//    - downcast_ref::<io::Error>() asks "is this actually an io::Error?"
//    - Returns Some(&io::Error) if it is, None otherwise
// -----------------------------------------------------------------------------
