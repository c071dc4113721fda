// src/checker/transport.rs
// =============================================================================
// Turns the user's transport settings into a configured reqwest Client.
//
// TransportOptions is built once from the command line and then only read.
// Every probe borrows it (or a clone of the Client built from it), nobody
// ever changes it, so it needs no locking.
// =============================================================================

use reqwest::{redirect, Client};
use std::time::Duration;

/// Default per-request timeout, in seconds, when the user doesn't pick one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    /// Accept self-signed, expired or hostname-mismatched certificates
    pub skip_certificate_verification: bool,
    /// When false, the first 3xx response is the final answer
    pub follow_redirects: bool,
    /// Ceiling for connect + TLS + send + reading the whole body
    pub timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            skip_certificate_verification: false,
            follow_redirects: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

// Builds an HTTP client configured per `opts`.
//
// Nothing touches the network here; the first connection happens when a
// request is sent. reqwest applies `timeout` from the start of connecting
// until the response body has been fully read.
pub fn build_client(opts: &TransportOptions) -> reqwest::Result<Client> {
    let policy = if opts.follow_redirects {
        redirect::Policy::default()
    } else {
        // A 3xx is handed back as the response instead of being followed
        redirect::Policy::none()
    };

    Client::builder()
        .timeout(opts.timeout)
        .redirect(policy)
        .danger_accept_invalid_certs(opts.skip_certificate_verification)
        .build()
}
