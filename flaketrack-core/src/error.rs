/// Top-level flaketrack error type.
///
/// All fallible operations in `flaketrack-core` return [`Result<T, FlaketrackError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum FlaketrackError {
    /// Error locating or reading a flaky-test report.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Error from the build store adapter (listing builds, reading metadata).
    #[error("Build store error: {0}")]
    Store(#[from] StoreError),

    /// Error communicating with the source-hosting API.
    #[error("Forge error: {0}")]
    Forge(#[from] ForgeError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed time range or date argument.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors from report discovery and decoding.
#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    /// No build carries an artifact matching the query.
    #[error("no JSON reports found in recent builds for {repo}")]
    NotFound {
        /// Repository queried, or `all repositories`.
        repo: String,
    },

    /// Matching artifacts exist, but the newest one is past the staleness budget.
    #[error("latest JSON report is outdated: {age_days:.2} days old (build {build_id})")]
    Stale {
        /// Build holding the newest matching artifact.
        build_id: u64,
        /// Age of that build in fractional days.
        age_days: f64,
    },

    /// The artifact could not be fetched from the build store.
    #[error("cannot read {path} from build {build_id}: {source}")]
    Io {
        build_id: u64,
        path: String,
        #[source]
        source: StoreError,
    },

    /// The artifact content is not a valid report.
    #[error("cannot decode {path} from build {build_id}: {source}")]
    Decode {
        build_id: u64,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A report could not be written to the artifacts directory.
    #[error("cannot write report to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Repository names become path segments and must be plain names.
    #[error("invalid repository name {0:?}")]
    InvalidRepo(String),
}

/// Errors from the build store adapter.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The job has no builds, or the requested build does not exist.
    #[error("Build not found: {0}")]
    BuildNotFound(String),

    /// Build metadata (`started.json`, `latest-build.txt`) is malformed.
    #[error("Invalid build metadata: {0}")]
    Metadata(String),

    /// Filesystem I/O error while listing or reading build storage.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from source-hosting API interactions.
#[derive(thiserror::Error, Debug)]
pub enum ForgeError {
    /// Network-level failure reaching the API.
    #[error("GitHub API network error: {0}")]
    Network(String),

    /// The API returned a non-success HTTP status.
    #[error("GitHub API error (HTTP {status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Response body could not be parsed into the expected shape.
    #[error("GitHub API response parse error: {0}")]
    Parse(String),
}

/// Errors in flaketrack configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors parsing user-supplied dates and time ranges.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// Neither a `YYYY-MM-DD` date nor a duration.
    #[error("cannot parse time {input:?}: expected YYYY-MM-DD or a duration like 24h")]
    Time { input: String },

    /// Not a duration.
    #[error("cannot parse time range {input:?}: {message}")]
    Duration { input: String, message: String },

    /// Not a calendar date.
    #[error("cannot parse date {input:?}: {message}")]
    Date { input: String, message: String },
}

/// Convenience alias for `Result<T, FlaketrackError>`.
pub type Result<T> = std::result::Result<T, FlaketrackError>;
