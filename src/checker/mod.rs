// src/checker/mod.rs
// =============================================================================
// This module contains everything needed to check one URL.
//
// Submodules:
// - validate: Is this line a URL at all? (no network)
// - transport: Builds the reqwest Client from the user's options
// - http: Sends the GET and turns the outcome into "UP ..." / "DOWN ..."
//
// Nothing in here is shared or mutable: a check only reads its options.
// =============================================================================

mod http;
mod transport;
mod validate;

// Re-export public items from submodules
// This lets users write `checker::Prober` instead of `checker::http::Prober`
pub use http::{probe, Outcome, ProbeResult, Prober};
pub use transport::{build_client, TransportOptions, DEFAULT_TIMEOUT_SECS};
pub use validate::is_valid_url;
