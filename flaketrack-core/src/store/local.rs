// Filesystem build store: reads a local mirror of the Prow bucket layout.
//
//   <root>/logs/<job>/latest-build.txt
//   <root>/logs/<job>/<build>/started.json      {"timestamp": <unix seconds>}
//   <root>/logs/<job>/<build>/artifacts/...

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::types::BuildId;

use super::traits::BuildStore;

const LATEST_BUILD_FILE: &str = "latest-build.txt";
const STARTED_FILE: &str = "started.json";
const ARTIFACTS_DIR: &str = "artifacts";

/// Build store backed by a directory tree (a `gsutil rsync` copy or a
/// mounted bucket).
#[derive(Debug, Clone)]
pub struct LocalBuildStore {
    root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct Started {
    timestamp: i64,
}

impl LocalBuildStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding every build of `job`.
    pub fn job_dir(&self, job: &str) -> PathBuf {
        self.root.join("logs").join(job)
    }

    /// Storage root of one build.
    pub fn build_dir(&self, job: &str, build: BuildId) -> PathBuf {
        self.job_dir(job).join(build.to_string())
    }

    /// Directory a build's artifacts are published under.
    pub fn artifacts_dir(&self, job: &str, build: BuildId) -> PathBuf {
        self.build_dir(job, build).join(ARTIFACTS_DIR)
    }
}

#[async_trait::async_trait]
impl BuildStore for LocalBuildStore {
    async fn list_build_ids(&self, job: &str) -> Result<Vec<BuildId>, StoreError> {
        let job_dir = self.job_dir(job);
        if !job_dir.is_dir() {
            return Err(StoreError::BuildNotFound(format!(
                "no builds for job {job} under {}",
                job_dir.display()
            )));
        }

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&job_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            // Non-numeric directories (e.g. `latest`) are not builds
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u64>().ok())
            {
                ids.push(BuildId(id));
            }
        }
        debug!(job, builds = ids.len(), "Listed builds");
        Ok(ids)
    }

    async fn latest_build_id(&self, job: &str) -> Result<BuildId, StoreError> {
        let path = self.job_dir(job).join(LATEST_BUILD_FILE);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::BuildNotFound(format!(
                    "{} does not exist",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        contents
            .trim()
            .parse::<u64>()
            .map(BuildId)
            .map_err(|e| StoreError::Metadata(format!("{}: {e}", path.display())))
    }

    async fn start_time(&self, job: &str, build: BuildId) -> Result<DateTime<Utc>, StoreError> {
        let path = self.build_dir(job, build).join(STARTED_FILE);
        let contents = std::fs::read(&path)?;
        let started: Started = serde_json::from_slice(&contents)
            .map_err(|e| StoreError::Metadata(format!("{}: {e}", path.display())))?;
        DateTime::from_timestamp(started.timestamp, 0).ok_or_else(|| {
            StoreError::Metadata(format!(
                "{}: timestamp {} out of range",
                path.display(),
                started.timestamp
            ))
        })
    }

    async fn list_artifacts(&self, job: &str, build: BuildId) -> Result<Vec<String>, StoreError> {
        let build_dir = self.build_dir(job, build);
        if !build_dir.is_dir() {
            return Err(StoreError::BuildNotFound(format!("{job}/{build}")));
        }

        let escaped = glob::Pattern::escape(&build_dir.join(ARTIFACTS_DIR).to_string_lossy());
        let pattern = format!("{escaped}/**/*");
        let paths = glob::glob(&pattern)
            .map_err(|e| StoreError::Metadata(format!("invalid artifact pattern {pattern}: {e}")))?;

        let mut artifacts = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "Unreadable artifact path");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&build_dir) {
                artifacts.push(to_slash_path(relative));
            }
        }
        artifacts.sort();
        Ok(artifacts)
    }

    async fn read_file(
        &self,
        job: &str,
        build: BuildId,
        path: &str,
    ) -> Result<Vec<u8>, StoreError> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StoreError::Metadata(format!(
                "artifact path escapes the build directory: {path}"
            )));
        }
        Ok(std::fs::read(self.build_dir(job, build).join(relative))?)
    }
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
