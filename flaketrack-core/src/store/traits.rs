use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::types::BuildId;

/// Read access to the storage a periodic CI job publishes its builds into.
///
/// Artifact paths are relative to the build's storage root and use `/` as
/// the separator, e.g. `artifacts/serving/flaky-tests.json`.
#[async_trait::async_trait]
pub trait BuildStore: Send + Sync {
    /// All known build IDs for `job`, in no particular order.
    async fn list_build_ids(&self, job: &str) -> Result<Vec<BuildId>, StoreError>;

    /// The build the job itself marks as most recent.
    async fn latest_build_id(&self, job: &str) -> Result<BuildId, StoreError>;

    /// When the build started.
    async fn start_time(&self, job: &str, build: BuildId) -> Result<DateTime<Utc>, StoreError>;

    /// Every artifact file the build published.
    async fn list_artifacts(&self, job: &str, build: BuildId) -> Result<Vec<String>, StoreError>;

    /// Raw contents of one file under the build's storage root.
    async fn read_file(&self, job: &str, build: BuildId, path: &str)
    -> Result<Vec<u8>, StoreError>;
}
