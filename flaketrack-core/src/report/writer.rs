use std::path::PathBuf;

use tracing::info;

use crate::config::ReporterSection;
use crate::error::ReportError;
use crate::types::FlakyReport;

/// Publishes reports into the local artifacts directory, which the CI
/// system uploads as the build's `artifacts/`.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    artifacts_dir: PathBuf,
    filename: String,
}

impl ReportWriter {
    pub fn new(artifacts_dir: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            filename: filename.into(),
        }
    }

    pub fn from_config(config: &ReporterSection) -> Self {
        Self::new(&config.artifacts_dir, &config.report_filename)
    }

    /// Where the report for `repo` is written.
    pub fn report_path(&self, repo: &str) -> PathBuf {
        self.artifacts_dir.join(repo).join(&self.filename)
    }

    /// Build the report for `repo` and, if `write_file`, publish it.
    pub fn create_report_for_repo(
        &self,
        repo: &str,
        flaky: Vec<String>,
        write_file: bool,
    ) -> Result<FlakyReport, ReportError> {
        if repo.is_empty() || repo.contains(['/', '\\']) || repo == "." || repo == ".." {
            return Err(ReportError::InvalidRepo(repo.to_string()));
        }
        let report = FlakyReport {
            repo: repo.to_string(),
            flaky,
        };
        if write_file {
            self.write(&report)?;
        }
        Ok(report)
    }

    fn write(&self, report: &FlakyReport) -> Result<(), ReportError> {
        let path = self.report_path(&report.repo);
        let wrap = |source: std::io::Error| ReportError::Write {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(wrap)?;
        }
        let contents = serde_json::to_vec(report).map_err(|e| wrap(e.into()))?;
        std::fs::write(&path, contents).map_err(wrap)?;
        info!(path = %path.display(), flaky = report.flaky.len(), "Wrote flaky test report");
        Ok(())
    }
}
