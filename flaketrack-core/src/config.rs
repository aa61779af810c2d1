use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "flaketrack.toml";

/// Top-level flaketrack configuration, matching `flaketrack.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlaketrackConfig {
    #[serde(default)]
    pub reporter: ReporterSection,
    #[serde(default)]
    pub github: GitHubSection,
    #[serde(default)]
    pub retryer: RetryerSection,
    #[serde(default)]
    pub ratios: RatiosSection,
}

impl FlaketrackConfig {
    /// Load a config file. A missing file is a [`ConfigError::NotFound`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reporter.job_name.is_empty() {
            return Err(ConfigError::Invalid("reporter.job_name is empty".into()));
        }
        if self.reporter.max_age_days == 0 {
            return Err(ConfigError::Invalid(
                "reporter.max_age_days must be at least 1".into(),
            ));
        }
        if self.github.org.is_empty() || self.github.repo.is_empty() {
            return Err(ConfigError::Invalid(
                "github.org and github.repo are required".into(),
            ));
        }
        // An empty marker or filename matches everything
        for (name, value) in [
            ("reporter.report_filename", &self.reporter.report_filename),
            ("retryer.retry_marker", &self.retryer.retry_marker),
            ("retryer.blocked_marker", &self.retryer.blocked_marker),
            ("retryer.expended_marker", &self.retryer.expended_marker),
            ("ratios.retry_command_prefix", &self.ratios.retry_command_prefix),
        ] {
            if value.is_empty() {
                return Err(ConfigError::Invalid(format!("{name} is empty")));
            }
        }
        self.ratios.cutover()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterSection {
    /// Name of the periodic job that publishes flaky-test reports.
    pub job_name: String,
    /// Maximum age in days for which a report is considered valid.
    pub max_age_days: u32,
    pub report_filename: String,
    /// Local directory that `write` publishes reports into.
    pub artifacts_dir: PathBuf,
    /// Root of the build storage mirror (`<root>/logs/<job>/<build>/...`).
    pub store_root: PathBuf,
}

impl Default for ReporterSection {
    fn default() -> Self {
        let artifacts_dir = std::env::var_os("ARTIFACTS")
            .map_or_else(|| PathBuf::from("artifacts"), PathBuf::from);
        Self {
            job_name: "ci-knative-flakes-reporter".to_string(),
            max_age_days: 4,
            report_filename: "flaky-tests.json".to_string(),
            artifacts_dir,
            store_root: PathBuf::from("gcs"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSection {
    pub org: String,
    pub repo: String,
    /// Environment variable holding the API token.
    pub token_env: String,
    pub api_base: String,
    /// User ID of the bot that posts retryer comments.
    pub retryer_bot_id: u64,
    /// Bot user IDs whose comments never count as manual retries.
    pub bot_ids: Vec<u64>,
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            org: "knative".to_string(),
            repo: "serving".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            api_base: "https://api.github.com".to_string(),
            retryer_bot_id: 48_565_599,
            bot_ids: vec![48_565_599, 41_213_312],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryerSection {
    pub retry_marker: String,
    pub blocked_marker: String,
    pub expended_marker: String,
    /// Status context whose state is reported as the integration status.
    pub integration_context: String,
    /// Administrative contexts ignored when computing PR status.
    pub excluded_contexts: Vec<String>,
}

impl Default for RetryerSection {
    fn default() -> Self {
        Self {
            retry_marker: "/test".to_string(),
            blocked_marker: "non-flaky".to_string(),
            expended_marker: "expended".to_string(),
            integration_context: "pull-knative-serving-integration-tests".to_string(),
            excluded_contexts: vec!["cla/google".to_string(), "tide".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatiosSection {
    /// Date the retryer was deployed; splits the ratio columns.
    pub cutover_date: String,
    /// Comment prefix that marks a manual retry request.
    pub retry_command_prefix: String,
}

impl RatiosSection {
    pub fn cutover(&self) -> Result<NaiveDate, ConfigError> {
        NaiveDate::parse_from_str(&self.cutover_date, "%Y-%m-%d").map_err(|e| {
            ConfigError::Invalid(format!(
                "ratios.cutover_date {:?}: {e}",
                self.cutover_date
            ))
        })
    }
}

impl Default for RatiosSection {
    fn default() -> Self {
        Self {
            cutover_date: "2019-08-02".to_string(),
            retry_command_prefix: "/test pull-knative-".to_string(),
        }
    }
}
