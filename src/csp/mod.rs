// src/csp/mod.rs
// =============================================================================
// This module turns Content-Security-Policy headers into domains.
//
// Submodules:
// - extract: Splits a header into tokens and cleans each one into a host
// - registry: Remembers which domains were already printed
//
// Neither submodule does any I/O. The scan module feeds them headers.
// =============================================================================

mod extract;
mod registry;

pub use extract::extract_domains;
pub use registry::DomainRegistry;
