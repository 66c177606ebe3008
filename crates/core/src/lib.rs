//! Workpool core model.
//!
//! Resources (exclusive locks and depleting counters), the executables that
//! bind them (tasks and processes), and the reports a run produces.

#![warn(missing_docs)]

// Identities and errors
mod id;
mod error;

// Resources
mod resource;
mod pool;

// Executables
mod executable;
mod task;
mod process;
mod report;

// Re-exports
pub use id::RunId;
pub use error::{Error, Result};

pub use resource::{
    Resource, ResourceKind, ReleaseStatus, UsableResource, ConsumableResource,
};
pub use pool::{ResourcePool, ResourceHandle};

pub use executable::{Executable, ExecutableSpec};
pub use task::Task;
pub use process::{Process, ProcessState};
pub use report::{ExecutionReport, ChildOutcome, ChildStatus, RunReport, RunOutcome};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
