use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::types::BuildId;

use super::traits::BuildStore;

/// In-memory build store for library callers that already hold build data,
/// and for tests.
#[derive(Debug, Default)]
pub struct MemoryBuildStore {
    jobs: HashMap<String, BTreeMap<BuildId, MemoryBuild>>,
}

#[derive(Debug)]
struct MemoryBuild {
    started: Option<DateTime<Utc>>,
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryBuildStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a build. `started = None` models a build whose start time
    /// cannot be read.
    pub fn add_build(&mut self, job: &str, build: BuildId, started: Option<DateTime<Utc>>) {
        self.jobs
            .entry(job.to_string())
            .or_default()
            .entry(build)
            .or_insert_with(|| MemoryBuild {
                started: None,
                files: BTreeMap::new(),
            })
            .started = started;
    }

    /// Add a file to an already registered build.
    pub fn add_file(
        &mut self,
        job: &str,
        build: BuildId,
        path: &str,
        contents: impl Into<Vec<u8>>,
    ) -> Result<(), StoreError> {
        let entry = self
            .jobs
            .get_mut(job)
            .and_then(|builds| builds.get_mut(&build))
            .ok_or_else(|| StoreError::BuildNotFound(format!("{job}/{build}")))?;
        entry.files.insert(path.to_string(), contents.into());
        Ok(())
    }

    fn build(&self, job: &str, build: BuildId) -> Result<&MemoryBuild, StoreError> {
        self.jobs
            .get(job)
            .and_then(|builds| builds.get(&build))
            .ok_or_else(|| StoreError::BuildNotFound(format!("{job}/{build}")))
    }
}

#[async_trait::async_trait]
impl BuildStore for MemoryBuildStore {
    async fn list_build_ids(&self, job: &str) -> Result<Vec<BuildId>, StoreError> {
        self.jobs
            .get(job)
            .map(|builds| builds.keys().copied().collect())
            .ok_or_else(|| StoreError::BuildNotFound(format!("no builds for job {job}")))
    }

    async fn latest_build_id(&self, job: &str) -> Result<BuildId, StoreError> {
        self.jobs
            .get(job)
            .and_then(|builds| builds.keys().next_back().copied())
            .ok_or_else(|| StoreError::BuildNotFound(format!("no builds for job {job}")))
    }

    async fn start_time(&self, job: &str, build: BuildId) -> Result<DateTime<Utc>, StoreError> {
        self.build(job, build)?
            .started
            .ok_or_else(|| StoreError::Metadata(format!("{job}/{build} has no start time")))
    }

    async fn list_artifacts(&self, job: &str, build: BuildId) -> Result<Vec<String>, StoreError> {
        Ok(self
            .build(job, build)?
            .files
            .keys()
            .filter(|path| path.starts_with("artifacts/"))
            .cloned()
            .collect())
    }

    async fn read_file(
        &self,
        job: &str,
        build: BuildId,
        path: &str,
    ) -> Result<Vec<u8>, StoreError> {
        self.build(job, build)?
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| {
                StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{job}/{build}/{path}"),
                ))
            })
    }
}
