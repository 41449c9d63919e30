//! Warning aggregation and matching.

pub mod aggregator;
pub mod matcher;

pub use aggregator::{ReportError, Warnings};
pub use matcher::WarningInfo;
