//! Per-pull-request retryer signals: reduced CI status and the retryer
//! bot's verdict.

pub mod comment;
pub mod status;

pub use comment::CommentClassifier;
pub use status::StatusAggregator;
