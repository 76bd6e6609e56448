//! Per-run execution report
//!
//! Collects what happened to each operation plus cleanup notes, so a host
//! harness can render results without re-parsing logs.

/// Outcome of one executed operation
#[derive(Debug, Clone)]
pub struct OperationRecord {
    /// Operation name
    pub name: String,
    /// Response status, if a response was obtained
    pub status: Option<u16>,
    /// Whether every assertion passed
    pub passed: bool,
    /// Failure description, if any
    pub detail: Option<String>,
}

/// Report for one spec execution
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Entity name from the spec
    pub entity: String,
    /// Records in execution order
    pub operations: Vec<OperationRecord>,
    /// Cleanup actions taken and failures swallowed
    pub cleanup_notes: Vec<String>,
}

impl RunReport {
    /// Empty report for an entity
    #[inline]
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            operations: Vec::new(),
            cleanup_notes: Vec::new(),
        }
    }

    /// Record a passing operation
    pub fn record_pass(&mut self, name: &str, status: u16) {
        self.operations.push(OperationRecord {
            name: name.to_string(),
            status: Some(status),
            passed: true,
            detail: None,
        });
    }

    /// Record a failing operation
    pub fn record_fail(&mut self, name: &str, status: Option<u16>, detail: &str) {
        self.operations.push(OperationRecord {
            name: name.to_string(),
            status,
            passed: false,
            detail: Some(detail.to_string()),
        });
    }

    /// Whether every recorded operation passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.operations.iter().all(|op| op.passed)
    }

    /// One-line-per-operation human-readable summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("{}:", self.entity)];
        for op in &self.operations {
            let status = op
                .status
                .map_or_else(|| "-".to_string(), |s| s.to_string());
            let verdict = if op.passed { "ok" } else { "FAIL" };
            match &op.detail {
                Some(d) => lines.push(format!("  {} [{}] {}: {}", op.name, status, verdict, d)),
                None => lines.push(format!("  {} [{}] {}", op.name, status, verdict)),
            }
        }
        for note in &self.cleanup_notes {
            lines.push(format!("  cleanup: {note}"));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_tracks_pass_fail() {
        let mut report = RunReport::new("Site");
        report.record_pass("create", 201);
        report.record_fail("get", Some(500), "expected status 200, got 500");

        assert!(!report.passed());
        assert_eq!(report.operations.len(), 2);
        assert!(report.operations[0].passed);
        assert!(!report.operations[1].passed);
    }

    #[test]
    fn summary_lists_operations_and_cleanup() {
        let mut report = RunReport::new("Site");
        report.record_pass("create", 201);
        report.cleanup_notes.push("deleted Site".to_string());

        let summary = report.summary();
        assert!(summary.contains("Site:"));
        assert!(summary.contains("create [201] ok"));
        assert!(summary.contains("cleanup: deleted Site"));
    }

    #[test]
    fn empty_report_passes_vacuously() {
        assert!(RunReport::new("Nothing").passed());
    }
}
