use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Build identity ─────────────────────────────────────────────────

/// Numeric ID of one run of a periodic job.
///
/// IDs are totally ordered, and descending ID order is used as a proxy for
/// descending start time. Build systems hand out IDs sequentially, but
/// nothing enforces that, so the locator documents the assumption where it
/// relies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildId(pub u64);

impl std::fmt::Display for BuildId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which build to read reports from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildSelector {
    /// Search for the freshest build with matching reports.
    #[default]
    Latest,
    /// Use this build as-is, without a freshness check.
    Exact(BuildId),
}

impl std::str::FromStr for BuildSelector {
    type Err = std::num::ParseIntError;

    /// Accepts `latest`, `-1` (the legacy sentinel) or a build number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "latest" | "-1" => Ok(Self::Latest),
            other => other.parse::<u64>().map(|id| Self::Exact(BuildId(id))),
        }
    }
}

// ── Flaky-test reports ─────────────────────────────────────────────

/// Current flaky tests for one repository, as published by the reporter job.
///
/// The serialized field names are the on-disk artifact format and must not
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlakyReport {
    pub repo: String,
    pub flaky: Vec<String>,
}

// ── Commit statuses ────────────────────────────────────────────────

/// State of a single commit status as reported by the source host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Success,
    Pending,
    Failure,
    Error,
}

impl StatusState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Pending => "pending",
            Self::Failure => "failure",
            Self::Error => "error",
        }
    }

    /// Errors count as failures for every status computation.
    pub fn normalized(self) -> Self {
        match self {
            Self::Error => Self::Failure,
            other => other,
        }
    }

    /// Rank used to combine statuses: failure > pending > success.
    pub fn precedence(self) -> u8 {
        match self.normalized() {
            Self::Success => 0,
            Self::Pending => 1,
            Self::Failure | Self::Error => 2,
        }
    }
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status posted against a pull request's head commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub state: StatusState,
    /// Name of the CI check, e.g. `pull-knative-serving-unit-tests`.
    pub context: String,
}

impl StatusEvent {
    pub fn new(state: StatusState, context: impl Into<String>) -> Self {
        Self {
            state,
            context: context.into(),
        }
    }
}

/// Reduced CI status of a pull request. `None` means unknown, not passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrStatus {
    pub integration: Option<StatusState>,
    pub overall: Option<StatusState>,
}

// ── Retryer comments ───────────────────────────────────────────────

/// What the retryer bot did on a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryState {
    /// No retryer comment, or one the classifier does not recognize.
    #[default]
    None,
    /// The retryer re-triggered failed jobs.
    Retried,
    /// The retryer refused because a failure was not flaky.
    Blocked,
    /// The retryer ran out of attempts.
    Expended,
}

impl RetryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Retried => "retried",
            Self::Blocked => "blocked",
            Self::Expended => "expended",
        }
    }
}

impl std::fmt::Display for RetryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Pull requests ──────────────────────────────────────────────────

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl PrState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Merged => "merged",
        }
    }
}

impl std::fmt::Display for PrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subset of a pull request the metrics need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    /// `open` or `closed` as reported by the host; see [`PullRequest::state`].
    pub closed: bool,
    pub html_url: String,
    pub statuses_url: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// A closed pull request with a merge time is merged.
    pub fn state(&self) -> PrState {
        match (self.closed, self.merged_at) {
            (false, _) => PrState::Open,
            (true, Some(_)) => PrState::Merged,
            (true, None) => PrState::Closed,
        }
    }
}

/// An issue comment on a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueComment {
    /// Author's numeric user ID, if the account still exists.
    pub user_id: Option<u64>,
    pub body: String,
}

// ── Metrics ────────────────────────────────────────────────────────

/// Per-day totals for the retry ratio report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub merged_prs: u32,
    pub retries: u32,
}

impl DailyBucket {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            merged_prs: 0,
            retries: 0,
        }
    }

    /// Retries per merged PR, or `None` for a day without merges.
    pub fn ratio(&self) -> Option<f64> {
        (self.merged_prs > 0).then(|| f64::from(self.retries) / f64::from(self.merged_prs))
    }
}

/// One row of the executions report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub attempts: u32,
    pub retry_state: RetryState,
    pub status: PrStatus,
    pub pr_state: PrState,
    pub url: String,
}
