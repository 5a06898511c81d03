// src/csp/extract.rs
// =============================================================================
// This module pulls domains out of a Content-Security-Policy header.
//
// A CSP header looks like this:
//
//   default-src 'self'; script-src https://cdn.example.com *.google.com;
//
// It is a list of directives, each followed by "source expressions".
// We don't care which directive a source belongs to - every source goes
// into one pool, and we keep the ones that look like hostnames.
//
// How a token is cleaned up:
// 1. Directive names ("script-src:") and quoted keywords ('self', also
//    'self'; at the end of a directive) are dropped
// 2. A leading https:// or http:// is removed
// 3. A leading "*." is remembered, then removed to get the bare host
// 4. One trailing ';' is removed
// 5. Anything after the first '/' (path) and first ':' (port) is removed
// 6. Whatever is left must contain a '.', otherwise it isn't a domain
//
// This is a text heuristic, not a hostname validator: "1.2.3-beta" would
// pass. That is accepted.
//
// Rust concepts:
// - Option<T>: A token either produces a host or it doesn't
// - Iterators: split_whitespace().filter_map(...) without building a Vec
// - String slices (&str): Most of the work is slicing, not allocating
// =============================================================================

use super::registry::DomainRegistry;

/// One host found in a CSP source expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHost {
    /// Host with the wildcard marker removed, e.g. "example.com".
    /// This is what deduplication is keyed on.
    pub bare: String,
    /// Host as written (minus scheme, path and port), e.g. "*.example.com".
    pub display: String,
}

impl SourceHost {
    /// The text we print for this host
    ///
    /// strip_wildcard = true  -> "example.com"
    /// strip_wildcard = false -> "*.example.com" (as written)
    pub fn output(&self, strip_wildcard: bool) -> &str {
        if strip_wildcard {
            &self.bare
        } else {
            &self.display
        }
    }
}

// Normalizes a single whitespace-delimited token from a CSP header
//
// Returns None for anything that doesn't look like a domain:
// directive names, keywords, scheme-only sources like "data:", etc.
pub fn parse_source(token: &str) -> Option<SourceHost> {
    // Directive names ending with ':' and quoted keywords like 'self'
    if token.ends_with(':') {
        return None;
    }
    let unterminated = token.strip_suffix(';').unwrap_or(token);
    if unterminated.len() >= 2 && unterminated.starts_with('\'') && unterminated.ends_with('\'') {
        return None;
    }

    let token = token
        .strip_prefix("https://")
        .or_else(|| token.strip_prefix("http://"))
        .unwrap_or(token);

    let token = token.strip_suffix(';').unwrap_or(token);

    // Path first, then port - both by first occurrence only
    let token = match token.find('/') {
        Some(idx) => &token[..idx],
        None => token,
    };
    let token = match token.find(':') {
        Some(idx) => &token[..idx],
        None => token,
    };

    // Only one "*." is removed, so "*.*.example.com" keeps its second marker
    let bare = token.strip_prefix("*.").unwrap_or(token);

    if bare.is_empty() || !bare.contains('.') {
        return None;
    }

    Some(SourceHost {
        bare: bare.to_string(),
        display: token.to_string(),
    })
}

// Iterates over every domain-looking source in a header, in order
//
// Duplicates are NOT removed here - that is the registry's job.
pub fn source_hosts(header: &str) -> impl Iterator<Item = SourceHost> + '_ {
    header.split_whitespace().filter_map(parse_source)
}

// Extracts the domains in `header` that have never been seen before
//
// Parameters:
//   header: raw Content-Security-Policy value
//   registry: the run-wide set of domains already printed
//   strip_wildcard: print "example.com" instead of "*.example.com"
//
// Returns: newly admitted domains, in the order they appear in the header
//
// "*.example.com" and "example.com" count as the same domain. Whichever
// shows up first (in any header, from any worker) is the one printed.
pub fn extract_domains(
    header: &str,
    registry: &DomainRegistry,
    strip_wildcard: bool,
) -> Vec<String> {
    source_hosts(header)
        .filter(|host| registry.try_admit(&host.bare))
        .map(|host| host.output(strip_wildcard).to_string())
        .collect()
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does strip_prefix / strip_suffix return?
//    - Option<&str>: Some(rest) if the text started (or ended) with the
//      pattern, None otherwise
//    - `.unwrap_or(token)` means "strip it if it's there, else keep going"
//    - Each call removes the pattern once, which is why "*.*.a.com" only
//      loses its first "*."
//
// 2. Why shadow `token` so many times?
//    - `let token = ...` makes a new binding that hides the old one
//    - Every step is a narrower slice of the same original string, so no
//      copies are made until we build the SourceHost
//
// 3. What is filter_map?
//    - Runs a closure returning Option<T> and keeps only the Some values
//    - parse_source already returns Option, so it can be passed directly
//
// 4. What does `+ '_` mean on the iterator return type?
//    - The iterator borrows `header`, so it can't outlive it
//    - '_ tells the compiler to tie the two lifetimes together
// -----------------------------------------------------------------------------
