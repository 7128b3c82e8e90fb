/// Crawl state definitions for one crawl run
///
/// A run is `Idle` until started, `Running` while it dispatches pages,
/// `Draining` once cancellation stops further dispatch, and `Completed` when
/// the summary has been produced.
use std::fmt;

/// Represents the lifecycle state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Coordinator built, no request accepted yet
    Idle,

    /// Pages are being dispatched from the frontier
    Running,

    /// Cancellation was raised; no new fetches are dispatched
    Draining,

    /// The run finished and its summary was produced (terminal)
    Completed,
}

impl CrawlState {
    /// Returns true if new fetches may still be dispatched
    pub fn can_dispatch(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true if the transition `self -> next` is legal
    ///
    /// ```text
    /// Idle -> Running -> Completed
    ///            |          ^
    ///            v          |
    ///         Draining -----+
    /// ```
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Completed)
                | (Self::Draining, Self::Completed)
        )
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(CrawlState::Idle.can_transition_to(CrawlState::Running));
        assert!(CrawlState::Running.can_transition_to(CrawlState::Completed));
        assert!(CrawlState::Running.can_transition_to(CrawlState::Draining));
        assert!(CrawlState::Draining.can_transition_to(CrawlState::Completed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!CrawlState::Idle.can_transition_to(CrawlState::Completed));
        assert!(!CrawlState::Idle.can_transition_to(CrawlState::Draining));
        assert!(!CrawlState::Draining.can_transition_to(CrawlState::Running));
        assert!(!CrawlState::Completed.can_transition_to(CrawlState::Running));
        assert!(!CrawlState::Running.can_transition_to(CrawlState::Running));
    }

    #[test]
    fn test_only_running_dispatches() {
        assert!(CrawlState::Running.can_dispatch());
        assert!(!CrawlState::Draining.can_dispatch());
        assert!(!CrawlState::Completed.can_dispatch());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CrawlState::Running), "running");
        assert_eq!(format!("{}", CrawlState::Completed), "completed");
    }
}
