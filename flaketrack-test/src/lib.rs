// Integration test fixtures for flaketrack: build storage trees and pull
// request histories.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};

use flaketrack_core::config::ReporterSection;
use flaketrack_core::forge::MemoryForge;
use flaketrack_core::report::ReportWriter;
use flaketrack_core::store::local::LocalBuildStore;
use flaketrack_core::types::{BuildId, PullRequest, StatusEvent};

pub const JOB: &str = "ci-knative-flakes-reporter";
pub const REPORT_FILE: &str = "flaky-tests.json";
pub const RETRYER_BOT: u64 = 48_565_599;
pub const OTHER_BOT: u64 = 41_213_312;

/// A temporary build storage tree in the Prow bucket layout.
#[derive(Debug)]
pub struct TestBuilds {
    pub dir: tempfile::TempDir,
}

impl Default for TestBuilds {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBuilds {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store(&self) -> LocalBuildStore {
        LocalBuildStore::new(self.path())
    }

    /// Reporter settings pointing at this tree.
    pub fn reporter_config(&self) -> ReporterSection {
        ReporterSection {
            store_root: self.path().to_path_buf(),
            artifacts_dir: self.path().join("artifacts-out"),
            ..ReporterSection::default()
        }
    }

    pub fn build_dir(&self, id: u64) -> PathBuf {
        self.store().build_dir(JOB, BuildId(id))
    }

    /// Create build `id` with a `started.json`, without touching `latest-build.txt`.
    pub fn add_build(&self, id: u64, started: DateTime<Utc>) -> &Self {
        let dir = self.build_dir(id);
        std::fs::create_dir_all(dir.join("artifacts")).unwrap();
        std::fs::write(
            dir.join("started.json"),
            format!("{{\"timestamp\": {}}}", started.timestamp()),
        )
        .unwrap();
        self
    }

    /// Create build `id` and point `latest-build.txt` at it.
    pub fn add_latest_build(&self, id: u64, started: DateTime<Utc>) -> &Self {
        self.add_build(id, started);
        self.set_latest(id)
    }

    pub fn set_latest(&self, id: u64) -> &Self {
        let job_dir = self.store().job_dir(JOB);
        std::fs::create_dir_all(&job_dir).unwrap();
        std::fs::write(job_dir.join("latest-build.txt"), id.to_string()).unwrap();
        self
    }

    /// Publish a report into build `id` the way the reporter job does.
    pub fn add_report(&self, id: u64, repo: &str, flaky: &[&str]) -> &Self {
        let writer = ReportWriter::new(self.store().artifacts_dir(JOB, BuildId(id)), REPORT_FILE);
        writer
            .create_report_for_repo(repo, flaky.iter().map(ToString::to_string).collect(), true)
            .unwrap();
        self
    }

    /// Write arbitrary bytes under build `id`'s artifacts.
    pub fn add_artifact(&self, id: u64, rel: &str, contents: &str) -> &Self {
        let path = self.store().artifacts_dir(JOB, BuildId(id)).join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
        self
    }
}

pub fn days_ago(now: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    #[allow(clippy::cast_possible_truncation)]
    let seconds = (days * 86_400.0).round() as i64;
    now - TimeDelta::seconds(seconds)
}

/// An open pull request in `knative/serving`.
pub fn pull_request(number: u64, created_at: DateTime<Utc>) -> PullRequest {
    PullRequest {
        number,
        closed: false,
        html_url: format!("https://github.com/knative/serving/pull/{number}"),
        statuses_url: format!("https://api.github.com/repos/knative/serving/statuses/sha{number}"),
        created_at,
        closed_at: None,
        merged_at: None,
    }
}

pub fn merged(mut pr: PullRequest, at: DateTime<Utc>) -> PullRequest {
    pr.closed = true;
    pr.closed_at = Some(at);
    pr.merged_at = Some(at);
    pr
}

pub fn closed(mut pr: PullRequest, at: DateTime<Utc>) -> PullRequest {
    pr.closed = true;
    pr.closed_at = Some(at);
    pr
}

/// Register `pr` with its comments and (newest-first) statuses.
pub fn add_pull(
    forge: &mut MemoryForge,
    pr: PullRequest,
    comments: &[(u64, &str)],
    statuses: Vec<StatusEvent>,
) {
    for (user, body) in comments {
        forge.add_comment(pr.number, Some(*user), *body);
    }
    forge.set_statuses(pr.statuses_url.clone(), statuses);
    forge.add_pull_request(pr);
}
