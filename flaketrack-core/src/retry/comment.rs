use std::sync::LazyLock;

use regex::Regex;

use crate::config::RetryerSection;
use crate::types::{IssueComment, RetryState};

/// `attempts/max` as printed by the retryer. Single ASCII digits on each
/// side, so `12/15` yields `2`.
static ATTEMPTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9])/[0-9]").expect("attempts pattern is valid"));

/// Classifies the retryer bot's comment on a pull request.
#[derive(Debug, Clone)]
pub struct CommentClassifier {
    bot_id: u64,
    retry_marker: String,
    blocked_marker: String,
    expended_marker: String,
}

impl CommentClassifier {
    pub fn new(config: &RetryerSection, bot_id: u64) -> Self {
        Self {
            bot_id,
            retry_marker: config.retry_marker.clone(),
            blocked_marker: config.blocked_marker.clone(),
            expended_marker: config.expended_marker.clone(),
        }
    }

    /// The first comment posted by the retryer bot, if any.
    pub fn retryer_comment<'c>(&self, comments: &'c [IssueComment]) -> Option<&'c IssueComment> {
        comments.iter().find(|c| c.user_id == Some(self.bot_id))
    }

    /// Retry state and attempt count for a (possibly absent) retryer comment.
    pub fn classify(&self, comment: Option<&IssueComment>) -> (RetryState, u32) {
        match comment {
            None => (RetryState::None, 0),
            Some(c) => (self.state(&c.body), parse_attempts(&c.body)),
        }
    }

    /// Markers are checked in a fixed order; the first one present wins.
    pub fn state(&self, body: &str) -> RetryState {
        if body.contains(&self.retry_marker) {
            RetryState::Retried
        } else if body.contains(&self.blocked_marker) {
            RetryState::Blocked
        } else if body.contains(&self.expended_marker) {
            RetryState::Expended
        } else {
            RetryState::None
        }
    }
}

/// Numerator of the first `N/M` in `body`, or 0.
pub fn parse_attempts(body: &str) -> u32 {
    ATTEMPTS
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
