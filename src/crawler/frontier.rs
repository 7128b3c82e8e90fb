//! Crawl frontier: the visited set and the pending FIFO queue
//!
//! The frontier is the single place that decides whether a discovered URL
//! will ever be fetched. `offer` applies, in order:
//! - URL identity (fragment stripped, http(s) only)
//! - the same-host scope of the seed
//! - visited, in-flight and pending deduplication
//!
//! URLs are handed out in the order they were first accepted, which makes the
//! traversal breadth-first.

use crate::url::{extract_host, normalize_url};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Traversal state of one crawl run
#[derive(Debug, Default)]
pub struct Frontier {
    /// Host every accepted URL must carry (taken from the seed)
    host: Option<String>,

    /// URLs whose processing finished, successfully or not
    visited: HashSet<String>,

    /// URLs popped but not yet marked visited
    in_flight: HashSet<String>,

    /// Membership index for `queue`
    pending: HashSet<String>,

    /// URLs awaiting a visit, in acceptance order
    queue: VecDeque<Url>,
}

impl Frontier {
    /// Creates an empty frontier with no scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all state and enqueues the seed
    ///
    /// The seed's host becomes the scope for every later `offer`.
    pub fn reset(&mut self, seed: &Url) {
        let mut seed = seed.clone();
        seed.set_fragment(None);

        self.host = extract_host(&seed);
        self.visited.clear();
        self.in_flight.clear();
        self.pending.clear();
        self.queue.clear();

        self.pending.insert(seed.as_str().to_string());
        self.queue.push_back(seed);
    }

    /// Removes and returns the oldest pending URL
    ///
    /// The URL stays in flight until [`Frontier::mark_visited`] is called, and
    /// cannot be offered again in the meantime.
    pub fn pop(&mut self) -> Option<Url> {
        let url = self.queue.pop_front()?;
        self.pending.remove(url.as_str());
        self.in_flight.insert(url.as_str().to_string());
        Some(url)
    }

    /// Records that a URL has been processed (successfully or not)
    pub fn mark_visited(&mut self, url: &Url) {
        let key = identity(url);
        self.in_flight.remove(&key);
        self.pending.remove(&key);
        self.queue.retain(|queued| queued.as_str() != key);
        self.visited.insert(key);
    }

    /// Offers a discovered URL to the frontier
    ///
    /// Returns true if the URL was accepted and enqueued. A URL is rejected if
    /// it is not http(s), lies outside the seed's host, or is already visited,
    /// in flight or pending.
    pub fn offer(&mut self, url: &Url) -> bool {
        let url = match normalize_url(url.as_str()) {
            Ok(url) => url,
            Err(_) => return false,
        };

        if self.host.is_none() || extract_host(&url) != self.host {
            return false;
        }

        let key = url.as_str();
        if self.visited.contains(key) || self.in_flight.contains(key) || self.pending.contains(key)
        {
            return false;
        }

        self.pending.insert(key.to_string());
        self.queue.push_back(url);
        true
    }

    /// Returns true if the URL has been marked visited
    #[cfg(test)]
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(&identity(url))
    }

    /// Number of URLs marked visited
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of URLs popped and not yet marked visited
    #[cfg(test)]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of URLs waiting in the queue
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no URL is waiting
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Discards every pending URL
    pub fn discard_pending(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        self.pending.clear();
        discarded
    }
}

fn identity(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.as_str().to_string()
}
