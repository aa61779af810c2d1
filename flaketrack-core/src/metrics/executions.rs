use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::config::FlaketrackConfig;
use crate::error::Result;
use crate::forge::Forge;
use crate::progress::ProgressReporter;
use crate::retry::{CommentClassifier, StatusAggregator};
use crate::types::{ExecutionRecord, PullRequest, RetryState, StatusState};

pub const CSV_HEADER: &str = "retries,retryer status,job status,overall status,pr state,url";

/// What the retryer did on each pull request active in a time window.
pub struct ExecutionsReport<'a> {
    forge: &'a dyn Forge,
    org: String,
    repo: String,
    classifier: CommentClassifier,
    aggregator: StatusAggregator,
}

impl std::fmt::Debug for ExecutionsReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionsReport")
            .field("org", &self.org)
            .field("repo", &self.repo)
            .field("classifier", &self.classifier)
            .field("aggregator", &self.aggregator)
            .finish_non_exhaustive()
    }
}

impl<'a> ExecutionsReport<'a> {
    pub fn new(forge: &'a dyn Forge, config: &FlaketrackConfig) -> Self {
        Self {
            forge,
            org: config.github.org.clone(),
            repo: config.github.repo.clone(),
            classifier: CommentClassifier::new(&config.retryer, config.github.retryer_bot_id),
            aggregator: StatusAggregator::new(&config.retryer),
        }
    }

    /// One record per pull request created or closed after `since` on which
    /// the retryer left a recognized comment.
    ///
    /// A pull request whose comments cannot be fetched is skipped with a
    /// warning. Failing to list pull requests or fetch statuses aborts.
    #[instrument(skip(self, progress), fields(org = %self.org, repo = %self.repo))]
    pub async fn collect(
        &self,
        since: DateTime<Utc>,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<ExecutionRecord>> {
        let pulls: Vec<PullRequest> = self
            .forge
            .list_pull_requests(&self.org, &self.repo)
            .await?
            .into_iter()
            .filter(|pr| active_since(pr, since))
            .collect();
        info!(pull_requests = pulls.len(), %since, "Scanning pull requests");

        progress.start("Classifying retryer comments", Some(pulls.len() as u64));
        let mut records = Vec::new();
        for pr in &pulls {
            let record = self.record_for(pr).await;
            progress.advance(1);
            if let Some(record) = record? {
                records.push(record);
            }
        }
        progress.finish();

        info!(records = records.len(), "Collected retryer executions");
        Ok(records)
    }

    async fn record_for(&self, pr: &PullRequest) -> Result<Option<ExecutionRecord>> {
        let comments = match self
            .forge
            .list_issue_comments(&self.org, &self.repo, pr.number)
            .await
        {
            Ok(comments) => comments,
            Err(e) => {
                warn!(pr = pr.number, error = %e, "Could not get comments, skipping");
                return Ok(None);
            }
        };

        let (retry_state, attempts) = self
            .classifier
            .classify(self.classifier.retryer_comment(&comments));
        if retry_state == RetryState::None {
            debug!(pr = pr.number, "No retryer activity");
            return Ok(None);
        }

        let events = self.forge.get_statuses(&pr.statuses_url).await?;
        Ok(Some(ExecutionRecord {
            attempts,
            retry_state,
            status: self.aggregator.aggregate(&events),
            pr_state: pr.state(),
            url: pr.html_url.clone(),
        }))
    }
}

/// Created after `since`, or closed after it.
fn active_since(pr: &PullRequest, since: DateTime<Utc>) -> bool {
    pr.created_at > since || pr.closed_at.is_some_and(|closed| closed > since)
}

/// Render records as CSV, unknown statuses as empty cells.
pub fn render_csv(records: &[ExecutionRecord]) -> String {
    let cell = |state: Option<StatusState>| state.map_or("", |s| s.as_str());
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 96);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in records {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{}",
            r.attempts,
            r.retry_state,
            cell(r.status.integration),
            cell(r.status.overall),
            r.pr_state,
            r.url
        );
    }
    out
}
