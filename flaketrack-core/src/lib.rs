//! Flaketrack core library: flaky-test reports and retryer metrics.
//!
//! [`report::ReportClient`] finds and reads the flaky-test reports a periodic
//! CI job publishes into a [`store::BuildStore`]. [`retry`] classifies what
//! the retry bot did on a pull request, and [`metrics`] turns a
//! [`forge::Forge`]'s pull request history into CSV reports.

pub mod config;
pub mod error;
pub mod forge;
pub mod metrics;
pub mod progress;
pub mod report;
pub mod retry;
pub mod store;
pub mod types;
