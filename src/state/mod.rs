//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the lifecycle of one crawl run (idle, running, draining, completed)

mod crawl_state;

// Re-export main types
pub use crawl_state::CrawlState;
