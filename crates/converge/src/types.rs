//! Core types for convergence

/// Current or desired state of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource exists/is configured
    Present { details: Option<String> },
    /// Resource does not exist/is not configured
    Absent,
    /// Resource exists but differs from desired
    Modified { from: String, to: String },
    /// State cannot be determined without applying
    Unknown,
}

/// Result of applying a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Resource was created
    Created,
    /// Resource was modified
    Modified,
    /// Resource was removed
    Removed,
    /// Apply failed
    Failed { error: String },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// A failure recorded by a continue-on-error step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Identifier of the resource or step that failed
    pub id: String,
    pub error: String,
}

/// Summary of execution results
#[derive(Debug, Clone, Default)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
    /// Every failure, in the order it happened
    pub failures: Vec<Failure>,
}

impl ExecuteSummary {
    /// Total number of actual changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.removed
    }

    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.removed + self.skipped + self.failed + self.no_change
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ExecuteSummary) {
        self.created += other.created;
        self.modified += other.modified;
        self.removed += other.removed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.no_change += other.no_change;
        self.failures.extend(other.failures.iter().cloned());
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, id: &str, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { error } => {
                self.failed += 1;
                self.failures.push(Failure {
                    id: id.to_string(),
                    error: error.clone(),
                });
            }
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_records_failures_in_order() {
        let mut summary = ExecuteSummary::default();
        summary.add_result("plugin:a", &ApplyResult::Created);
        summary.add_result(
            "plugin:b",
            &ApplyResult::Failed {
                error: "not found".into(),
            },
        );
        summary.add_result("theme:c", &ApplyResult::NoChange);
        summary.add_result(
            "theme:d",
            &ApplyResult::Failed {
                error: "timeout".into(),
            },
        );

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.total_changes(), 1);
        assert!(!summary.is_success());
        let ids: Vec<_> = summary.failures.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["plugin:b", "theme:d"]);
    }

    #[test]
    fn test_merge() {
        let mut a = ExecuteSummary::default();
        a.add_result("x", &ApplyResult::Modified);
        let mut b = ExecuteSummary::default();
        b.add_result("y", &ApplyResult::Failed { error: "e".into() });
        b.add_result("z", &ApplyResult::Skipped { reason: "r".into() });

        a.merge(&b);
        assert_eq!(a.modified, 1);
        assert_eq!(a.failed, 1);
        assert_eq!(a.skipped, 1);
        assert_eq!(a.failures.len(), 1);
    }

    #[test]
    fn test_result_predicates() {
        assert!(ApplyResult::Skipped { reason: String::new() }.is_success());
        assert!(!ApplyResult::Failed { error: String::new() }.is_success());
    }
}
