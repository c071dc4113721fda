// src/dispatch/mod.rs
// =============================================================================
// Fan-out / fan-in: one task per URL, one shared output, one final wait.
//
// Submodules:
// - sink: The Mutex-guarded writer every task prints through
// - runner: Reads the input, spawns probes, waits for all of them
// =============================================================================

mod runner;
mod sink;

pub use runner::{dispatch_all, DispatchReport, Dispatcher, OutputFormat};
pub use sink::Sink;
