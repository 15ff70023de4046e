//! Monthly aggregation and portfolio analytics.

pub mod monthly;
pub mod summary;

pub use monthly::{MonthlyAggregator, MonthlyAnalysis};
pub use summary::AnalyticsCalculator;
