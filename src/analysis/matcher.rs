//! Per-warning provenance matching and detail rendering.
//!
//! A [`WarningInfo`] is built for a single detail query, matched against the
//! retained logs once, and discarded. The aggregator keeps only merged
//! counts, so this second pass is what recovers which tests produced a
//! given warning.

use crate::analysis::aggregator::ReportError;
use crate::models::{TestLog, WarningDetails};

/// One queried warning and, after matching, its per-log provenance.
pub struct WarningInfo {
    warning: String,
    /// Combined count known to the aggregator at query time.
    aggregate_count: usize,
    /// Occurrences found during the match pass.
    count: usize,
    /// `(job identity, count in that log)` pairs.
    matches: Vec<(String, usize)>,
}

impl WarningInfo {
    /// Start an unmatched query for one warning.
    pub fn new(warning: impl Into<String>, aggregate_count: usize) -> Self {
        Self {
            warning: warning.into(),
            aggregate_count,
            count: 0,
            matches: Vec::new(),
        }
    }

    /// Re-scan each log's table for the exact warning text and record the
    /// logs that contain it.
    pub fn match_in_logs(&mut self, logs: &[TestLog]) {
        for log in logs {
            if let Some(count) = log.warnings.get(&self.warning) {
                self.count += count;
                self.matches.push((log.job_name.clone(), *count));
            }
        }
    }

    /// Total occurrences found by the match pass.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Combined count the aggregator knew at query time.
    pub fn aggregate_count(&self) -> usize {
        self.aggregate_count
    }

    /// Render the detail report: a one-line summary and a block listing up
    /// to `test_summary_count` tests by descending per-log count.
    ///
    /// Fails with `WarningNotFound` when nothing matched, mirroring the
    /// aggregator's precondition so the two layers cannot disagree.
    pub fn details(
        &self,
        repo: &str,
        revision: &str,
        platform: &str,
        test_summary_count: usize,
    ) -> Result<WarningDetails, ReportError> {
        if self.count == 0 {
            return Err(ReportError::WarningNotFound {
                warning: self.warning.clone(),
            });
        }

        let mut matches = self.matches.clone();
        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let summary = format!(
            "{} occurrences of \"{}\" in {} revision {} ({})",
            self.count, self.warning, repo, revision, platform
        );

        let shown = matches.len().min(test_summary_count);
        let mut lines = Vec::with_capacity(shown + 2);
        lines.push(format!("Affected tests ({}):", matches.len()));
        for (job, count) in matches.iter().take(shown) {
            lines.push(format!("{:6} {}", count, job));
        }
        if matches.len() > test_summary_count {
            lines.push(format!(
                "  ... and {} more tests not shown",
                matches.len() - shown
            ));
        }

        Ok(WarningDetails {
            summary,
            details: lines.join("\n"),
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_log(job: &str, warnings: &[(&str, usize)]) -> TestLog {
        TestLog {
            job_name: job.to_string(),
            log_url: format!("https://example.com/{}", job),
            warnings: warnings
                .iter()
                .map(|(w, c)| (w.to_string(), *c))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_match_in_logs_records_provenance() {
        let logs = vec![
            make_log("test-a", &[("WARNING: leak", 3), ("WARNING: other", 1)]),
            make_log("test-b", &[("WARNING: leak", 2)]),
            make_log("test-c", &[("WARNING: unrelated", 9)]),
        ];

        let mut info = WarningInfo::new("WARNING: leak", 5);
        info.match_in_logs(&logs);

        assert_eq!(info.count(), 5);
        assert_eq!(info.aggregate_count(), 5);
        assert_eq!(info.matches.len(), 2);
    }

    #[test]
    fn test_details_sorted_by_descending_count() {
        let logs = vec![
            make_log("test-small", &[("WARNING: leak", 1)]),
            make_log("test-big", &[("WARNING: leak", 7)]),
            make_log("test-mid", &[("WARNING: leak", 4)]),
        ];

        let mut info = WarningInfo::new("WARNING: leak", 12);
        info.match_in_logs(&logs);
        let details = info
            .details("mozilla-central", "abc123", "linux1804-64-qr", 10)
            .unwrap();

        assert_eq!(
            details.matches,
            vec![
                ("test-big".to_string(), 7),
                ("test-mid".to_string(), 4),
                ("test-small".to_string(), 1),
            ]
        );
        assert!(details.summary.contains("12 occurrences"));
        assert!(details.summary.contains("abc123"));
    }

    #[test]
    fn test_details_truncates_and_marks_overflow() {
        let logs: Vec<TestLog> = (0..7)
            .map(|i| make_log(&format!("test-{}", i), &[("WARNING: leak", 1)]))
            .collect();

        let mut info = WarningInfo::new("WARNING: leak", 7);
        info.match_in_logs(&logs);
        let details = info
            .details("mozilla-central", "abc123", "linux1804-64-qr", 4)
            .unwrap();

        let listed = details
            .details
            .lines()
            .filter(|l| l.trim_start().starts_with('1'))
            .count();
        assert_eq!(listed, 4);
        assert!(details.details.contains("3 more tests not shown"));
        // Raw match data stays complete even when the listing truncates.
        assert_eq!(details.matches.len(), 7);
    }

    #[test]
    fn test_details_without_truncation_has_no_marker() {
        let logs = vec![make_log("test-a", &[("WARNING: leak", 2)])];
        let mut info = WarningInfo::new("WARNING: leak", 2);
        info.match_in_logs(&logs);

        let details = info
            .details("mozilla-central", "abc123", "linux1804-64-qr", 10)
            .unwrap();
        assert!(!details.details.contains("more tests"));
    }

    #[test]
    fn test_details_with_zero_matches_fails() {
        let mut info = WarningInfo::new("WARNING: never seen", 0);
        info.match_in_logs(&[]);

        let err = info
            .details("mozilla-central", "abc123", "linux1804-64-qr", 10)
            .unwrap_err();
        assert!(matches!(err, ReportError::WarningNotFound { .. }));
    }

    #[test]
    fn test_detail_ties_order_by_job_name() {
        let logs = vec![
            make_log("test-z", &[("WARNING: leak", 2)]),
            make_log("test-a", &[("WARNING: leak", 2)]),
        ];

        let mut info = WarningInfo::new("WARNING: leak", 4);
        info.match_in_logs(&logs);
        let details = info
            .details("mozilla-central", "abc123", "linux1804-64-qr", 10)
            .unwrap();

        assert_eq!(details.matches[0].0, "test-a");
        assert_eq!(details.matches[1].0, "test-z");
    }
}
