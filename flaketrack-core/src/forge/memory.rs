use std::collections::{HashMap, HashSet};

use crate::error::ForgeError;
use crate::types::{IssueComment, PullRequest, StatusEvent};

use super::Forge;

/// In-memory forge holding a single repository's pull requests.
///
/// The `org` and `repo` arguments of every call are ignored.
#[derive(Debug, Default)]
pub struct MemoryForge {
    pulls: Vec<PullRequest>,
    comments: HashMap<u64, Vec<IssueComment>>,
    statuses: HashMap<String, Vec<StatusEvent>>,
    failing_comments: HashSet<u64>,
}

impl MemoryForge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pull_request(&mut self, pr: PullRequest) {
        self.pulls.push(pr);
    }

    /// Append a comment to pull request `number`.
    pub fn add_comment(&mut self, number: u64, user_id: Option<u64>, body: impl Into<String>) {
        self.comments.entry(number).or_default().push(IssueComment {
            user_id,
            body: body.into(),
        });
    }

    /// Statuses served for `statuses_url`, newest first.
    pub fn set_statuses(&mut self, statuses_url: impl Into<String>, events: Vec<StatusEvent>) {
        self.statuses.insert(statuses_url.into(), events);
    }

    /// Make comment listing for pull request `number` fail.
    pub fn fail_comments(&mut self, number: u64) {
        self.failing_comments.insert(number);
    }
}

#[async_trait::async_trait]
impl Forge for MemoryForge {
    async fn list_pull_requests(
        &self,
        _org: &str,
        _repo: &str,
    ) -> Result<Vec<PullRequest>, ForgeError> {
        Ok(self.pulls.clone())
    }

    async fn list_issue_comments(
        &self,
        _org: &str,
        _repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>, ForgeError> {
        if self.failing_comments.contains(&number) {
            return Err(ForgeError::Api {
                status: 502,
                body: format!("comments for #{number} unavailable"),
            });
        }
        Ok(self.comments.get(&number).cloned().unwrap_or_default())
    }

    async fn get_statuses(&self, statuses_url: &str) -> Result<Vec<StatusEvent>, ForgeError> {
        self.statuses
            .get(statuses_url)
            .cloned()
            .ok_or_else(|| ForgeError::Api {
                status: 404,
                body: format!("no statuses at {statuses_url}"),
            })
    }
}
