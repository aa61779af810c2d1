// Freshness-bounded search for the newest build carrying matching reports.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::error::{ReportError, Result, StoreError};
use crate::types::{BuildId, BuildSelector};

use super::{ReportClient, repo_label};

impl ReportClient<'_> {
    /// Resolve `selector` to a build holding reports for `repo`.
    ///
    /// An exact build is returned unchecked. Otherwise the job's latest
    /// build is accepted as soon as it has a matching report, with no age
    /// check. Failing that, builds are scanned newest-ID first and the first
    /// one with matching reports wins if it started within the staleness
    /// budget. If it did not, the search fails with [`ReportError::Stale`]
    /// without looking further back.
    #[instrument(skip(self), fields(job = %self.job))]
    pub async fn locate(&self, repo: &str, selector: BuildSelector) -> Result<BuildId> {
        match selector {
            BuildSelector::Exact(build) => Ok(build),
            BuildSelector::Latest => self.latest_valid_build(repo, Utc::now()).await,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    async fn latest_valid_build(&self, repo: &str, now: DateTime<Utc>) -> Result<BuildId> {
        let mut checked = None;
        match self.store.latest_build_id(&self.job).await {
            Ok(latest) => {
                match self.report_paths(latest, repo).await {
                    Ok(paths) if !paths.is_empty() => {
                        info!(build = %latest, "Using latest build");
                        return Ok(latest);
                    }
                    Ok(_) => debug!(build = %latest, "Latest build has no matching reports"),
                    Err(e) => debug!(build = %latest, error = %e, "Cannot list latest build"),
                }
                checked = Some(latest);
            }
            Err(e) => debug!(error = %e, "Cannot resolve latest build, scanning history"),
        }

        let mut build_ids = match self.store.list_build_ids(&self.job).await {
            Ok(ids) => ids,
            Err(StoreError::BuildNotFound(_)) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        // Descending ID stands in for descending start time.
        build_ids.sort_unstable_by(|a, b| b.cmp(a));

        let cutoff = now - self.max_age;
        for build in build_ids {
            if checked == Some(build) {
                continue;
            }
            match self.report_paths(build, repo).await {
                Ok(paths) if !paths.is_empty() => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!(build = %build, error = %e, "Skipping build with unlistable artifacts");
                    continue;
                }
            }
            let started = match self.store.start_time(&self.job, build).await {
                Ok(t) => t,
                Err(e) => {
                    warn!(build = %build, error = %e, "Skipping build without start time");
                    continue;
                }
            };
            if started > cutoff {
                info!(build = %build, started = %started, "Using most recent fresh build");
                return Ok(build);
            }
            // Every older ID is assumed to have started earlier still.
            let age_days = (now - started).num_seconds() as f64 / 86_400.0;
            return Err(ReportError::Stale {
                build_id: build.0,
                age_days,
            }
            .into());
        }

        Err(ReportError::NotFound {
            repo: repo_label(repo),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use crate::config::ReporterSection;
    use crate::error::FlaketrackError;
    use crate::report::ReportClient;
    use crate::store::BuildStore;
    use crate::store::memory::MemoryBuildStore;

    use super::*;

    const JOB: &str = "ci-knative-flakes-reporter";
    const SERVING: &str = r#"{"repo":"serving","flaky":["TestA"]}"#;

    fn add(store: &mut MemoryBuildStore, id: u64, age_days: i64, repos: &[&str]) {
        let started = Utc::now() - TimeDelta::days(age_days);
        store.add_build(JOB, BuildId(id), Some(started));
        for repo in repos {
            store
                .add_file(
                    JOB,
                    BuildId(id),
                    &format!("artifacts/{repo}/flaky-tests.json"),
                    SERVING,
                )
                .unwrap();
        }
    }

    async fn locate(store: &MemoryBuildStore, repo: &str) -> Result<BuildId> {
        ReportClient::new(store, &ReporterSection::default())
            .locate(repo, BuildSelector::Latest)
            .await
    }

    #[tokio::test]
    async fn explicit_build_skips_search() {
        let store = MemoryBuildStore::new();
        let client = ReportClient::new(&store, &ReporterSection::default());
        let build = client
            .locate("serving", BuildSelector::Exact(BuildId(42)))
            .await
            .unwrap();
        assert_eq!(build, BuildId(42));
    }

    #[tokio::test]
    async fn latest_build_is_trusted_regardless_of_age() {
        let mut store = MemoryBuildStore::new();
        add(&mut store, 5, 30, &["serving"]);
        add(&mut store, 9, 20, &["serving"]);
        assert_eq!(locate(&store, "serving").await.unwrap(), BuildId(9));
    }

    #[tokio::test]
    async fn falls_back_to_fresh_older_build() {
        let mut store = MemoryBuildStore::new();
        add(&mut store, 7, 3, &["serving"]);
        add(&mut store, 8, 2, &["eventing"]);
        add(&mut store, 9, 0, &["eventing"]);
        assert_eq!(locate(&store, "serving").await.unwrap(), BuildId(7));
    }

    #[tokio::test]
    async fn stale_match_stops_the_scan() {
        let mut store = MemoryBuildStore::new();
        // A fresher start time on an older ID is never reached
        add(&mut store, 3, 1, &["serving"]);
        add(&mut store, 7, 5, &["serving"]);
        add(&mut store, 9, 0, &["eventing"]);
        match locate(&store, "serving").await {
            Err(FlaketrackError::Report(ReportError::Stale { build_id, age_days })) => {
                assert_eq!(build_id, 7);
                assert!((4.9..5.1).contains(&age_days), "age was {age_days}");
            }
            other => panic!("expected stale error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_matches_anywhere_is_not_found() {
        let mut store = MemoryBuildStore::new();
        add(&mut store, 1, 1, &["eventing"]);
        add(&mut store, 2, 0, &[]);
        assert!(matches!(
            locate(&store, "serving").await,
            Err(FlaketrackError::Report(ReportError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let store = MemoryBuildStore::new();
        assert!(matches!(
            locate(&store, "").await,
            Err(FlaketrackError::Report(ReportError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn builds_without_start_time_are_skipped() {
        let mut store = MemoryBuildStore::new();
        add(&mut store, 6, 1, &["serving"]);
        store.add_build(JOB, BuildId(8), None);
        store
            .add_file(JOB, BuildId(8), "artifacts/serving/flaky-tests.json", SERVING)
            .unwrap();
        add(&mut store, 9, 0, &[]);
        assert_eq!(locate(&store, "serving").await.unwrap(), BuildId(6));
    }

    #[tokio::test]
    async fn empty_repo_matches_any_report() {
        let mut store = MemoryBuildStore::new();
        add(&mut store, 4, 1, &["eventing"]);
        add(&mut store, 5, 0, &[]);
        assert_eq!(locate(&store, "").await.unwrap(), BuildId(4));
    }

    #[tokio::test]
    async fn scan_order_is_numeric_not_lexical() {
        let mut store = MemoryBuildStore::new();
        add(&mut store, 9, 2, &["serving"]);
        add(&mut store, 10, 1, &["serving"]);
        add(&mut store, 11, 0, &[]);
        assert_eq!(locate(&store, "serving").await.unwrap(), BuildId(10));
    }

    /// Memory store whose artifact listing fails for chosen builds.
    #[derive(Debug)]
    struct Unlistable {
        inner: MemoryBuildStore,
        broken: Vec<BuildId>,
    }

    #[async_trait::async_trait]
    impl BuildStore for Unlistable {
        async fn list_build_ids(&self, job: &str) -> std::result::Result<Vec<BuildId>, StoreError> {
            self.inner.list_build_ids(job).await
        }

        async fn latest_build_id(&self, job: &str) -> std::result::Result<BuildId, StoreError> {
            self.inner.latest_build_id(job).await
        }

        async fn start_time(
            &self,
            job: &str,
            build: BuildId,
        ) -> std::result::Result<DateTime<Utc>, StoreError> {
            self.inner.start_time(job, build).await
        }

        async fn list_artifacts(
            &self,
            job: &str,
            build: BuildId,
        ) -> std::result::Result<Vec<String>, StoreError> {
            if self.broken.contains(&build) {
                return Err(StoreError::Io(std::io::Error::other("permission denied")));
            }
            self.inner.list_artifacts(job, build).await
        }

        async fn read_file(
            &self,
            job: &str,
            build: BuildId,
            path: &str,
        ) -> std::result::Result<Vec<u8>, StoreError> {
            self.inner.read_file(job, build, path).await
        }
    }

    #[tokio::test]
    async fn unlistable_builds_are_skipped() {
        let mut inner = MemoryBuildStore::new();
        add(&mut inner, 5, 1, &["serving"]);
        add(&mut inner, 7, 1, &["serving"]);
        add(&mut inner, 9, 0, &["serving"]);
        let store = Unlistable {
            inner,
            broken: vec![BuildId(7), BuildId(9)],
        };
        let build = ReportClient::new(&store, &ReporterSection::default())
            .locate("serving", BuildSelector::Latest)
            .await
            .unwrap();
        assert_eq!(build, BuildId(5));
    }
}
