use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, instrument, warn};

use crate::config::FlaketrackConfig;
use crate::error::Result;
use crate::forge::Forge;
use crate::progress::ProgressReporter;
use crate::types::{DailyBucket, IssueComment, PullRequest};

pub const CSV_HEADER: &str = "date,retries,prs,ratio,ratio";

/// Manual retries per merged pull request, per day.
pub struct RatiosReport<'a> {
    forge: &'a dyn Forge,
    org: String,
    repo: String,
    retry_prefix: String,
    bot_ids: HashSet<u64>,
}

impl std::fmt::Debug for RatiosReport<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatiosReport")
            .field("org", &self.org)
            .field("repo", &self.repo)
            .field("retry_prefix", &self.retry_prefix)
            .field("bot_ids", &self.bot_ids)
            .finish_non_exhaustive()
    }
}

impl<'a> RatiosReport<'a> {
    pub fn new(forge: &'a dyn Forge, config: &FlaketrackConfig) -> Self {
        Self {
            forge,
            org: config.github.org.clone(),
            repo: config.github.repo.clone(),
            retry_prefix: config.ratios.retry_command_prefix.clone(),
            bot_ids: config.github.bot_ids.iter().copied().collect(),
        }
    }

    /// Daily buckets from the date of `since` through the date of `now`,
    /// with every pull request merged after `since` counted on its merge
    /// date. Days without merges are present with zero counts.
    #[instrument(skip(self, progress), fields(org = %self.org, repo = %self.repo))]
    pub async fn collect(
        &self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<DailyBucket>> {
        let mut buckets = init_buckets(since.date_naive(), now.date_naive());

        let merged: Vec<(PullRequest, DateTime<Utc>)> = self
            .forge
            .list_pull_requests(&self.org, &self.repo)
            .await?
            .into_iter()
            .filter_map(|pr| {
                let merged_at = pr.merged_at.filter(|at| *at > since)?;
                Some((pr, merged_at))
            })
            .collect();
        info!(merged = merged.len(), %since, "Scanning merged pull requests");

        progress.start("Counting manual retries", Some(merged.len() as u64));
        for (pr, merged_at) in &merged {
            progress.advance(1);
            let comments = match self
                .forge
                .list_issue_comments(&self.org, &self.repo, pr.number)
                .await
            {
                Ok(comments) => comments,
                Err(e) => {
                    warn!(pr = pr.number, error = %e, "Could not get comments, skipping");
                    continue;
                }
            };
            let retries = count_manual_retries(&comments, &self.retry_prefix, &self.bot_ids);
            let date = merged_at.date_naive();
            let bucket = buckets
                .entry(date)
                .or_insert_with(|| DailyBucket::new(date));
            bucket.merged_prs += 1;
            bucket.retries += retries;
        }
        progress.finish();

        Ok(buckets.into_values().collect())
    }
}

/// One empty bucket per day in `start..=end`.
pub fn init_buckets(start: NaiveDate, end: NaiveDate) -> BTreeMap<NaiveDate, DailyBucket> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| (date, DailyBucket::new(date)))
        .collect()
}

/// Comments by non-bot authors that issue a retry command. Comments from
/// deleted accounts count as human.
pub fn count_manual_retries(comments: &[IssueComment], prefix: &str, bot_ids: &HashSet<u64>) -> u32 {
    let count = comments
        .iter()
        .filter(|c| c.body.contains(prefix))
        .filter(|c| c.user_id.is_none_or(|id| !bot_ids.contains(&id)))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Render buckets as CSV in date order.
///
/// Ratios go in the fourth column up to and including `cutover`, and in the
/// fifth column from `cutover` on, so the cutover day fills both. Days
/// without merges leave the ratio cells blank.
pub fn render_csv(buckets: &[DailyBucket], cutover: NaiveDate) -> String {
    let mut sorted = buckets.to_vec();
    sorted.sort_by_key(|b| b.date);

    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + sorted.len() * 32);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for bucket in &sorted {
        let ratio = bucket.ratio().map(|r| format!("{r:.3}")).unwrap_or_default();
        let _ = write!(
            out,
            "{},{},{},",
            bucket.date.format("%Y-%m-%d"),
            bucket.retries,
            bucket.merged_prs
        );
        if bucket.date <= cutover {
            out.push_str(&ratio);
        }
        if bucket.date >= cutover {
            out.push(',');
            out.push_str(&ratio);
        }
        out.push('\n');
    }
    out
}
