use tracing::{debug, info, instrument};

use crate::error::{ReportError, Result};
use crate::types::{BuildId, BuildSelector, FlakyReport};

use super::ReportClient;

impl ReportClient<'_> {
    /// Decode one report artifact.
    pub async fn read(&self, build: BuildId, path: &str) -> std::result::Result<FlakyReport, ReportError> {
        let contents = self
            .store
            .read_file(&self.job, build, path)
            .await
            .map_err(|source| ReportError::Io {
                build_id: build.0,
                path: path.to_string(),
                source,
            })?;
        serde_json::from_slice(&contents).map_err(|source| ReportError::Decode {
            build_id: build.0,
            path: path.to_string(),
            source,
        })
    }

    /// Every report for `repo` (all repos when empty) in the selected build.
    ///
    /// One unreadable or malformed artifact fails the whole collection.
    #[instrument(skip(self), fields(job = %self.job))]
    pub async fn collect_reports(
        &self,
        repo: &str,
        selector: BuildSelector,
    ) -> Result<Vec<FlakyReport>> {
        let build = self.locate(repo, selector).await?;
        let paths = self.report_paths(build, repo).await?;

        let mut reports = Vec::with_capacity(paths.len());
        for path in &paths {
            debug!(build = %build, path = %path, "Reading report");
            reports.push(self.read(build, path).await?);
        }
        info!(build = %build, reports = reports.len(), "Collected flaky test reports");
        Ok(reports)
    }

    /// Collect reports and run `extract` over each, flattening what it
    /// yields into one sequence in report order.
    pub async fn parse_with_filter<T, I, F>(
        &self,
        repo: &str,
        selector: BuildSelector,
        mut extract: F,
    ) -> Result<(Vec<FlakyReport>, Vec<T>)>
    where
        F: FnMut(&FlakyReport) -> I,
        I: IntoIterator<Item = T>,
    {
        let reports = self.collect_reports(repo, selector).await?;
        let mut results = Vec::new();
        for report in &reports {
            results.extend(extract(report));
        }
        Ok((reports, results))
    }
}
