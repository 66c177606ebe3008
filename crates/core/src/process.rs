//! Process model - composite work that owns a resource pool.
//!
//! A run walks this state machine:
//!
//! ```text
//! Pending → ResourceCheck → (Skipped | Bound) → Executing → Released → Completed
//!                 any step ──────────────────────────────────────────→ Errored
//! ```
//!
//! Children are driven strictly one after another. Each child is checked,
//! bound, executed and released against the shared pool before the next one
//! starts, and a failing child never stops its siblings.

use crate::error::{Error, Result};
use crate::executable::{Executable, ExecutableSpec};
use crate::id::RunId;
use crate::pool::{ResourceHandle, ResourcePool};
use crate::report::{ChildOutcome, ExecutionReport, RunOutcome, RunReport};
use crate::resource::Resource;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Where a process is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessState {
    /// Not run yet
    Pending,
    /// Checking own requirements against the pool
    ResourceCheck,
    /// Requirements could not be met; nothing ran
    Skipped,
    /// Own resources bound
    Bound,
    /// Driving children
    Executing,
    /// Own resources released
    Released,
    /// Run finished
    Completed,
    /// Run failed
    Errored,
}

/// A process owns a pool and an ordered list of children.
#[derive(Debug)]
pub struct Process {
    spec: ExecutableSpec,
    pool: ResourcePool,
    children: Vec<Executable>,
    state: ProcessState,
}

impl Process {
    /// Create a new process with an empty pool and no children.
    pub fn new<I, S>(
        name: impl Into<String>,
        description: impl Into<String>,
        required_resources: I,
        duration_in_units: i64,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            spec: ExecutableSpec::new(name, description, required_resources, duration_in_units)?,
            pool: ResourcePool::new(),
            children: Vec::new(),
            state: ProcessState::Pending,
        })
    }

    /// Append a resource to the pool.
    pub fn add_resource(&mut self, resource: impl Into<Resource>) -> ResourceHandle {
        self.pool.add(resource)
    }

    /// Append a child task or process.
    pub fn add_task(&mut self, executable: impl Into<Executable>) {
        self.children.push(executable.into());
    }

    /// Shared executable state.
    pub fn spec(&self) -> &ExecutableSpec {
        &self.spec
    }

    pub(crate) fn spec_mut(&mut self) -> &mut ExecutableSpec {
        &mut self.spec
    }

    /// Process name.
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// The owned pool.
    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[Executable] {
        &self.children
    }

    /// State reached by the last [`run`](Self::run).
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Whether the own pool can satisfy this process's requirements.
    pub fn can_execute(&self) -> bool {
        self.spec.can_execute(&self.pool)
    }

    /// Bind this process's own requirements from its own pool.
    ///
    /// Only valid for a top-level process; a nested process is bound from
    /// its parent's pool by the parent.
    fn assign_resources(&mut self) -> Result<()> {
        self.spec.assign_resources(&mut self.pool)
    }

    /// Release this process's own bindings back to its own pool.
    fn release_resources(&mut self) {
        self.spec.release_resources(&mut self.pool)
    }

    /// Run the whole bind → execute → release cycle.
    ///
    /// Never fails: skips and errors come back in the report.
    pub fn run(&mut self) -> RunReport {
        let run_id = RunId::new();
        let started_at = chrono::Utc::now();
        self.transition(ProcessState::Pending);

        let outcome = self.drive_run();

        match &outcome {
            RunOutcome::Completed(_) => {
                info!(%run_id, process = %self.name(), "Process {} completed successfully.", self.name());
            }
            RunOutcome::Skipped { reason } => {
                warn!(%run_id, process = %self.name(), "Process {} skipped: {}", self.name(), reason);
            }
            RunOutcome::Errored { error, .. } => {
                error!(%run_id, process = %self.name(), "Error running process {}: {}", self.name(), error);
            }
        }

        RunReport {
            run_id,
            process: self.name().to_string(),
            started_at,
            finished_at: chrono::Utc::now(),
            outcome,
        }
    }

    fn drive_run(&mut self) -> RunOutcome {
        if !self.spec.required_resources().is_empty() {
            self.transition(ProcessState::ResourceCheck);
            if !self.can_execute() {
                self.transition(ProcessState::Skipped);
                return RunOutcome::Skipped {
                    reason: "not enough resources in pool to start".to_string(),
                };
            }
            if let Err(e) = self.assign_resources() {
                self.transition(ProcessState::Errored);
                return errored(&e);
            }
            self.transition(ProcessState::Bound);
        }

        self.transition(ProcessState::Executing);
        let result = self.execute();
        self.release_resources();
        self.transition(ProcessState::Released);

        match result {
            Ok(report) => {
                self.transition(ProcessState::Completed);
                RunOutcome::Completed(report)
            }
            Err(e) => {
                self.transition(ProcessState::Errored);
                errored(&e)
            }
        }
    }

    /// Use own bindings from the own pool, then drive every child.
    ///
    /// Child skips and failures are recorded in the report; only a broken
    /// own binding fails the call.
    pub fn execute(&mut self) -> Result<ExecutionReport> {
        let used = self.use_own(&self.pool)?;
        Ok(self.drive_children(used))
    }

    /// Execute as the child of another process whose pool holds our bindings.
    pub(crate) fn execute_nested(&mut self, host: &ResourcePool) -> Result<ExecutionReport> {
        let used = self.use_own(host)?;
        Ok(self.drive_children(used))
    }

    fn use_own(&self, host: &ResourcePool) -> Result<Vec<String>> {
        if !self.spec.required_resources().is_empty() {
            self.spec.ensure_bound()?;
        }
        info!(
            process = %self.name(),
            "Executing process {}: {} (Duration: {} units)",
            self.name(),
            self.spec.description(),
            self.spec.duration_in_units()
        );
        self.spec.use_resources(host)
    }

    fn drive_children(&mut self, used: Vec<String>) -> ExecutionReport {
        let mut children = Vec::with_capacity(self.children.len());
        for child in self.children.iter_mut() {
            children.push(drive_child(child, &mut self.pool));
        }
        ExecutionReport {
            executable: self.spec.name().to_string(),
            used,
            children,
        }
    }

    fn transition(&mut self, next: ProcessState) {
        debug!(process = %self.spec.name(), from = ?self.state, to = ?next, "State transition");
        self.state = next;
    }
}

fn drive_child(child: &mut Executable, pool: &mut ResourcePool) -> ChildOutcome {
    let name = child.name().to_string();

    if !child.can_execute(pool) {
        warn!(task = %name, "Task {} skipped: not enough resources.", name);
        return ChildOutcome::skipped(name);
    }

    let result = bind_and_execute(child, pool);
    child.release_resources(pool);

    match result {
        Ok(report) => ChildOutcome::executed(name, report),
        Err(e) => {
            warn!(
                task = %name,
                error = e.as_label(),
                recoverable = e.is_recoverable(),
                "Error executing task {}: {}",
                name,
                e
            );
            ChildOutcome::failed(name, &e)
        }
    }
}

fn bind_and_execute(child: &mut Executable, pool: &mut ResourcePool) -> Result<ExecutionReport> {
    child.assign_resources(pool)?;
    child.execute(pool)
}

fn errored(e: &Error) -> RunOutcome {
    RunOutcome::Errored {
        label: e.as_label(),
        error: e.to_string(),
    }
}
