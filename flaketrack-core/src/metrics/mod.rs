//! Retryer effectiveness reports built from pull request history.
//!
//! [`executions`] lists what the retryer did on each recent pull request;
//! [`ratios`] tracks manual retries per merged pull request per day.

pub mod executions;
pub mod ratios;
pub mod timerange;

pub use executions::ExecutionsReport;
pub use ratios::RatiosReport;
