//! Safety governor
//!
//! The provider has been seen reporting `hasMore = false` too early. Before a
//! loading run honors that signal it asks the governor, which may override it
//! and keep the run going. The governor only looks at a [`PageObservation`];
//! it never touches the store or the network.

use std::fmt;

use crate::config::GovernorConfig;

/// What the coordinator knew right after a page came back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageObservation {
    pub page: u32,
    pub items_received: usize,
    pub page_size: u32,
    pub reported_has_more: bool,
    /// Entries in the store after merging this page
    pub total_loaded: usize,
    /// Page requests made so far in this run
    pub pages_tried: u32,
}

impl PageObservation {
    pub fn is_full_page(&self) -> bool {
        self.page_size > 0 && self.items_received >= self.page_size as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideReason {
    /// Last page was full, so it probably was not the last one
    SuspiciousFullPage,
    /// Far fewer entries than a catalog of this provider normally has
    BelowExpectedMinimum { loaded: usize, expected: usize },
}

impl fmt::Display for OverrideReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverrideReason::SuspiciousFullPage => write!(f, "full page reported as last page"),
            OverrideReason::BelowExpectedMinimum { loaded, expected } => {
                write!(f, "only {} entries loaded, expected at least {}", loaded, expected)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernorDecision {
    /// Provider says there is more; nothing to decide
    Continue,
    /// Provider says it is done, but keep going anyway
    Override(OverrideReason),
    /// Honor the end signal
    Stop,
}

impl GovernorDecision {
    pub fn keeps_going(&self) -> bool {
        !matches!(self, GovernorDecision::Stop)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SafetyGovernor {
    config: GovernorConfig,
}

impl SafetyGovernor {
    pub fn new(config: GovernorConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, observation: &PageObservation) -> GovernorDecision {
        if observation.reported_has_more {
            return GovernorDecision::Continue;
        }

        if self.config.continue_after_full_last_page && observation.is_full_page() {
            return GovernorDecision::Override(OverrideReason::SuspiciousFullPage);
        }

        let expected = self.config.min_expected_entries;
        if observation.total_loaded < expected
            && observation.pages_tried < self.config.min_expected_page_limit
        {
            return GovernorDecision::Override(OverrideReason::BelowExpectedMinimum {
                loaded: observation.total_loaded,
                expected,
            });
        }

        GovernorDecision::Stop
    }
}
