// src/checker/validate.rs
// =============================================================================
// Decides whether an input line is worth sending an HTTP request to.
//
// This is a purely syntactic check, done with the `url` crate, and it is
// as forgiving as an HTTP request line:
// - Absolute URLs with a scheme ("https://example.com/path") are accepted
// - A scheme with an empty host ("http://") is accepted too
// - Absolute paths ("/status", "/a b") are accepted
// - Everything else ("", "not a url", "://missing-scheme") is rejected
//
// No DNS lookups, no network. A valid URL can still be DOWN, and lines like
// "http://" always will be.
// =============================================================================

use url::Url;

// Any base works here, it only exists so absolute paths can be parsed.
const PATH_BASE: &str = "http://localhost/";

/// Returns true if `s` parses as an absolute URL or an absolute path.
pub fn is_valid_url(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    if s.starts_with('/') {
        // Joined as a path so "//host/path" doesn't pick up a new host
        return Url::parse(PATH_BASE)
            .and_then(|base| base.join(&format!("/.{}", s)))
            .is_ok();
    }

    match Url::parse(s) {
        Ok(_) => true,
        // The scheme parsed; the missing host is the request's problem
        Err(url::ParseError::EmptyHost) => true,
        Err(_) => false,
    }
}
