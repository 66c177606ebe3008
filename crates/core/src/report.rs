//! Execution and run reports.

use crate::error::Error;
use crate::id::RunId;
use crate::Time;
use serde::Serialize;

/// What one execute call did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    /// Executable name
    pub executable: String,

    /// Resources used, in the order `use` was called
    pub used: Vec<String>,

    /// Per-child outcomes, in insertion order (always empty for tasks)
    pub children: Vec<ChildOutcome>,
}

impl ExecutionReport {
    /// Report for a leaf task.
    pub fn leaf(executable: impl Into<String>, used: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            used,
            children: Vec::new(),
        }
    }

    /// Names of children that ran to completion.
    pub fn executed(&self) -> Vec<&str> {
        self.names_where(|s| matches!(s, ChildStatus::Executed(_)))
    }

    /// Names of children skipped for lack of resources.
    pub fn skipped(&self) -> Vec<&str> {
        self.names_where(|s| matches!(s, ChildStatus::Skipped))
    }

    /// Names of children whose bind or execute failed.
    pub fn failed(&self) -> Vec<&str> {
        self.names_where(|s| matches!(s, ChildStatus::Failed { .. }))
    }

    fn names_where(&self, pred: impl Fn(&ChildStatus) -> bool) -> Vec<&str> {
        self.children
            .iter()
            .filter(|c| pred(&c.status))
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Outcome for a single child of a process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildOutcome {
    /// Child name
    pub name: String,

    /// What happened
    pub status: ChildStatus,
}

impl ChildOutcome {
    pub(crate) fn executed(name: String, report: ExecutionReport) -> Self {
        Self {
            name,
            status: ChildStatus::Executed(report),
        }
    }

    pub(crate) fn skipped(name: String) -> Self {
        Self {
            name,
            status: ChildStatus::Skipped,
        }
    }

    pub(crate) fn failed(name: String, error: &Error) -> Self {
        Self {
            name,
            status: ChildStatus::Failed {
                label: error.as_label(),
                error: error.to_string(),
            },
        }
    }
}

/// Child status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChildStatus {
    /// Bound, executed and released
    Executed(ExecutionReport),

    /// Not enough free resources; not an error
    Skipped,

    /// Binding or execution failed; siblings kept going
    Failed {
        /// Stable error label
        label: &'static str,
        /// Human-readable message
        error: String,
    },
}

/// Result of a top-level [`Process::run`](crate::Process::run).
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique identifier of this run
    pub run_id: RunId,

    /// Process name
    pub process: String,

    /// When the run started
    pub started_at: Time,

    /// When the run finished
    pub finished_at: Time,

    /// How it ended
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Only a completed run counts as success, skipped children or not.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed(_))
    }

    /// The execution report, if the run completed.
    pub fn execution(&self) -> Option<&ExecutionReport> {
        match &self.outcome {
            RunOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Process executed; children may still have been skipped or failed
    Completed(ExecutionReport),

    /// Process requirements could not be met, nothing ran
    Skipped {
        /// Why
        reason: String,
    },

    /// Binding or execution failed
    Errored {
        /// Stable error label
        label: &'static str,
        /// Human-readable message
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_name_lists() {
        let report = ExecutionReport {
            executable: "p".into(),
            used: vec![],
            children: vec![
                ChildOutcome::executed("a".into(), ExecutionReport::leaf("a", vec!["CPU".into()])),
                ChildOutcome::skipped("b".into()),
                ChildOutcome::failed("c".into(), &Error::ResourceUnavailable("CPU".into())),
            ],
        };

        assert_eq!(report.executed(), vec!["a"]);
        assert_eq!(report.skipped(), vec!["b"]);
        assert_eq!(report.failed(), vec!["c"]);
    }

    #[test]
    fn test_child_status_serializes_tagged() {
        let outcome = ChildOutcome::skipped("b".into());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["name"], "b");
        assert_eq!(json["status"]["status"], "skipped");
    }
}
