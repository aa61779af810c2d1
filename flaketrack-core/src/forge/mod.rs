//! Source-hosting collaborators: pull requests, comments, and commit statuses.

pub mod github;
pub mod memory;

use crate::error::ForgeError;
use crate::types::{IssueComment, PullRequest, StatusEvent};

pub use github::GitHubClient;
pub use memory::MemoryForge;

/// The read-only slice of a source-hosting API the retry metrics need.
#[async_trait::async_trait]
pub trait Forge: Send + Sync {
    /// Every pull request in `org/repo`, open and closed.
    async fn list_pull_requests(&self, org: &str, repo: &str)
    -> Result<Vec<PullRequest>, ForgeError>;

    /// Issue comments on pull request `number`, oldest first.
    async fn list_issue_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>, ForgeError>;

    /// Commit statuses behind a pull request's `statuses_url`, newest first.
    async fn get_statuses(&self, statuses_url: &str) -> Result<Vec<StatusEvent>, ForgeError>;
}
