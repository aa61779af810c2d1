//! Flaky-test report discovery, reading, and publishing.
//!
//! The reporter job publishes one `flaky-tests.json` per repository into
//! each build's artifacts. [`ReportClient`] finds the freshest usable build
//! ([`locator`]) and decodes its reports ([`reader`]); [`writer`] produces
//! the artifacts in the first place.

pub mod locator;
pub mod reader;
pub mod writer;

use chrono::TimeDelta;

use crate::config::ReporterSection;
use crate::store::BuildStore;
use crate::types::BuildId;

pub use writer::ReportWriter;

/// Reads flaky-test reports published by one periodic job.
pub struct ReportClient<'a> {
    store: &'a dyn BuildStore,
    job: String,
    filename: String,
    max_age: TimeDelta,
}

impl std::fmt::Debug for ReportClient<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportClient")
            .field("job", &self.job)
            .field("filename", &self.filename)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl<'a> ReportClient<'a> {
    pub fn new(store: &'a dyn BuildStore, config: &ReporterSection) -> Self {
        Self {
            store,
            job: config.job_name.clone(),
            filename: config.report_filename.clone(),
            max_age: TimeDelta::days(i64::from(config.max_age_days)),
        }
    }

    /// Artifact paths in `build` holding reports for `repo` (all repos when empty).
    pub async fn report_paths(&self, build: BuildId, repo: &str) -> crate::error::Result<Vec<String>> {
        let artifacts = self.store.list_artifacts(&self.job, build).await?;
        Ok(artifacts
            .into_iter()
            .filter(|path| is_report_path(path, repo, &self.filename))
            .collect())
    }
}

/// Whether `path` is the report file of `repo`, or of any repo when `repo`
/// is empty. A plain suffix test: `serving` also matches
/// `knative-serving/flaky-tests.json`.
pub(crate) fn is_report_path(path: &str, repo: &str, filename: &str) -> bool {
    if repo.is_empty() {
        path.ends_with(filename)
    } else {
        path.ends_with(&format!("{repo}/{filename}"))
    }
}

/// Human-readable name for a repo query.
pub(crate) fn repo_label(repo: &str) -> String {
    if repo.is_empty() {
        "all repositories".to_string()
    } else {
        repo.to_string()
    }
}
