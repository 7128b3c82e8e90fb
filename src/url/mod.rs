//! URL handling module for Site-Harvester
//!
//! This module provides URL identity (the normalized form used by the frontier)
//! and host comparison for the same-domain filter.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_host, same_host};
pub use normalize::{normalize_url, resolve_http_url};
