use std::collections::HashSet;

use crate::config::RetryerSection;
use crate::types::{PrStatus, StatusEvent, StatusState};

/// Reduces a pull request's status history to one integration status and
/// one overall status.
#[derive(Debug, Clone)]
pub struct StatusAggregator {
    integration_context: String,
    excluded_contexts: HashSet<String>,
}

impl StatusAggregator {
    pub fn new(config: &RetryerSection) -> Self {
        Self {
            integration_context: config.integration_context.clone(),
            excluded_contexts: config.excluded_contexts.iter().cloned().collect(),
        }
    }

    /// Aggregate `events`, which must be ordered newest first.
    ///
    /// Only the newest event per context counts, `error` counts as
    /// `failure`, and excluded contexts are ignored. The overall status is
    /// the highest-precedence remaining state (failure > pending > success).
    /// With nothing left to consider, both statuses are `None`.
    pub fn aggregate(&self, events: &[StatusEvent]) -> PrStatus {
        let mut status = PrStatus::default();
        for (context, state) in latest_per_context(events) {
            if self.excluded_contexts.contains(context) {
                continue;
            }
            let state = state.normalized();
            if context == self.integration_context {
                status.integration = Some(state);
            }
            status.overall = Some(match status.overall {
                None => state,
                Some(current) => combine(current, state),
            });
        }
        status
    }
}

/// First (newest) state of each context, in first-seen order.
pub fn latest_per_context(events: &[StatusEvent]) -> Vec<(&str, StatusState)> {
    let mut seen = HashSet::new();
    events
        .iter()
        .filter(|event| seen.insert(event.context.as_str()))
        .map(|event| (event.context.as_str(), event.state))
        .collect()
}

/// Fold `next` into the running overall status.
fn combine(current: StatusState, next: StatusState) -> StatusState {
    // Ties keep the earlier state, so a failure is never replaced
    if next.precedence() > current.precedence() {
        next
    } else {
        current
    }
}
