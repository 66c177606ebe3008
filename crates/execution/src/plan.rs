//! Declarative plan files.
//!
//! A plan is JSON describing one or more top-level processes, their pools
//! and their children:
//!
//! ```json
//! {
//!   "processes": [{
//!     "name": "CompileMain",
//!     "description": "Compile main.cpp",
//!     "requires": ["CPU", "Memory"],
//!     "duration": 15,
//!     "resources": [
//!       { "kind": "usable", "name": "CPU", "capacity": 3 },
//!       { "kind": "consumable", "name": "Memory", "capacity": 4096 }
//!     ],
//!     "children": [
//!       { "type": "task", "name": "ScanSourceCode", "requires": ["CPU"], "duration": 2 }
//!     ]
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use workpool_core::{Executable, Process, Resource, Task};

/// Errors that can occur while loading or building a plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A resource or executable failed validation
    #[error("invalid plan: {0}")]
    Invalid(#[from] workpool_core::Error),

    /// No processes declared
    #[error("plan declares no processes")]
    Empty,
}

/// A full plan file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Top-level processes, run in order
    pub processes: Vec<ProcessPlan>,
}

/// A process and everything it owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessPlan {
    /// Process name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Resource names the process itself binds
    #[serde(default)]
    pub requires: Vec<String>,

    /// Duration in units
    pub duration: i64,

    /// Pool contents, in order
    #[serde(default)]
    pub resources: Vec<ResourcePlan>,

    /// Children, in order
    #[serde(default)]
    pub children: Vec<ExecutablePlan>,
}

/// A leaf task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPlan {
    /// Task name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Resource names the task binds
    #[serde(default)]
    pub requires: Vec<String>,

    /// Duration in units
    pub duration: i64,
}

/// A pool resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourcePlan {
    /// Exclusive lock with an informational rate
    Usable {
        /// Resource name
        name: String,
        /// Capacity rate
        capacity: f64,
    },
    /// Depleting counter
    Consumable {
        /// Resource name
        name: String,
        /// Total units
        capacity: i64,
    },
}

/// A child entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutablePlan {
    /// Leaf task
    Task(TaskPlan),
    /// Nested process
    Process(ProcessPlan),
}

impl Plan {
    /// Parse a plan from JSON.
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        let plan: Plan = serde_json::from_str(json)?;
        if plan.processes.is_empty() {
            return Err(PlanError::Empty);
        }
        Ok(plan)
    }

    /// Read and parse a plan file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading plan");
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build every top-level process.
    pub fn build(&self) -> Result<Vec<Process>, PlanError> {
        self.processes.iter().map(ProcessPlan::build).collect()
    }
}

impl ProcessPlan {
    /// Build the process, its pool and its children.
    pub fn build(&self) -> Result<Process, PlanError> {
        let mut process = Process::new(
            self.name.as_str(),
            self.description.as_str(),
            self.requires.iter().cloned(),
            self.duration,
        )?;
        for resource in &self.resources {
            process.add_resource(resource.build()?);
        }
        for child in &self.children {
            process.add_task(child.build()?);
        }
        Ok(process)
    }
}

impl TaskPlan {
    /// Build the task.
    pub fn build(&self) -> Result<Task, PlanError> {
        Ok(Task::new(
            self.name.as_str(),
            self.description.as_str(),
            self.requires.iter().cloned(),
            self.duration,
        )?)
    }
}

impl ResourcePlan {
    /// Build the resource.
    pub fn build(&self) -> Result<Resource, PlanError> {
        let resource = match self {
            ResourcePlan::Usable { name, capacity } => Resource::usable(name.as_str(), *capacity)?,
            ResourcePlan::Consumable { name, capacity } => {
                Resource::consumable(name.as_str(), *capacity)?
            }
        };
        Ok(resource)
    }
}

impl ExecutablePlan {
    /// Build the child.
    pub fn build(&self) -> Result<Executable, PlanError> {
        Ok(match self {
            ExecutablePlan::Task(t) => t.build()?.into(),
            ExecutablePlan::Process(p) => p.build()?.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use workpool_core::Error;

    const PLAN: &str = r#"{
        "processes": [{
            "name": "build",
            "duration": 10,
            "resources": [
                { "kind": "usable", "name": "CPU", "capacity": 2.5 },
                { "kind": "consumable", "name": "Mem", "capacity": 1 }
            ],
            "children": [
                { "type": "task", "name": "compile", "requires": ["CPU", "Mem"], "duration": 2 },
                { "type": "task", "name": "test", "requires": ["Mem"], "duration": 1 },
                { "type": "process", "name": "link", "requires": ["CPU"], "duration": 3,
                  "resources": [{ "kind": "usable", "name": "Disk", "capacity": 1 }],
                  "children": [{ "type": "task", "name": "write", "requires": ["Disk"], "duration": 1 }] }
            ]
        }]
    }"#;

    #[test]
    fn test_parse_and_build() {
        let plan = Plan::from_json(PLAN).unwrap();
        let processes = plan.build().unwrap();
        assert_eq!(processes.len(), 1);

        let process = &processes[0];
        assert_eq!(process.name(), "build");
        assert_eq!(process.pool().len(), 2);
        assert_eq!(process.children().len(), 3);
        assert!(matches!(process.children()[2], Executable::Process(_)));
    }

    #[test]
    fn test_built_plan_runs() {
        let mut processes = Plan::from_json(PLAN).unwrap().build().unwrap();
        let report = processes[0].run();
        assert!(report.is_success());

        let execution = report.execution().unwrap();
        assert_eq!(execution.executed(), vec!["compile", "link"]);
        assert_eq!(execution.skipped(), vec!["test"]);
    }

    #[test]
    fn test_invalid_capacity_is_reported() {
        let json = r#"{ "processes": [{ "name": "p", "duration": 1,
            "resources": [{ "kind": "consumable", "name": "Mem", "capacity": 0 }] }] }"#;
        let err = Plan::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(
            err,
            PlanError::Invalid(Error::InvalidCapacity { ref name }) if name == "Mem"
        ));
    }

    #[test]
    fn test_invalid_duration_is_reported() {
        let json = r#"{ "processes": [{ "name": "p", "duration": 1,
            "children": [{ "type": "task", "name": "t", "duration": -1 }] }] }"#;
        let err = Plan::from_json(json).unwrap().build().unwrap_err();
        assert!(matches!(err, PlanError::Invalid(Error::InvalidDuration { .. })));
    }

    #[test]
    fn test_empty_plan_rejected() {
        assert!(matches!(
            Plan::from_json(r#"{ "processes": [] }"#),
            Err(PlanError::Empty)
        ));
        assert!(matches!(Plan::from_json("not json"), Err(PlanError::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PLAN.as_bytes()).unwrap();

        let plan = Plan::load(file.path()).unwrap();
        assert_eq!(plan.processes[0].name, "build");

        let missing = file.path().with_extension("missing");
        assert!(matches!(Plan::load(missing), Err(PlanError::Io(_))));
    }
}
