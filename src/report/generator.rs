//! Plain-text report rendering.
//!
//! The text contracts here are stable output consumed by operators and
//! scripts; change them deliberately.

use crate::models::{TopReport, WarningDetails};

/// Render the top-N warning frequency report.
///
/// Layout: header, one right-aligned count per warning, and a total that
/// covers the entire table rather than the displayed slice.
pub fn generate_top_report(report: &TopReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("Top {} Warnings\n", report.requested));
    output.push_str("===============\n");

    for (warning, count) in &report.entries {
        output.push_str(&format!("{:6} {}\n", count, warning));
    }

    output.push_str(&format!("TOTAL WARNINGS: {}\n", report.total));

    output
}

/// Render the detail report for a single warning: summary line, blank line,
/// then the detail block.
pub fn generate_details_report(details: &WarningDetails) -> String {
    format!("{}\n\n{}", details.summary, details.details)
}
