//! Task model - the leaf unit of work.

use crate::error::Result;
use crate::executable::ExecutableSpec;
use crate::pool::ResourcePool;
use crate::report::ExecutionReport;
use tracing::info;

/// A task uses its bound resources and reports completion.
#[derive(Debug, Clone)]
pub struct Task {
    spec: ExecutableSpec,
}

impl Task {
    /// Create a new task.
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
        })
    }

    /// Shared executable state.
    pub fn spec(&self) -> &ExecutableSpec {
        &self.spec
    }

    /// Shared executable state, for binding and release.
    pub fn spec_mut(&mut self) -> &mut ExecutableSpec {
        &mut self.spec
    }

    /// Task name.
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// Use every bound resource in order.
    ///
    /// Fails with `BindingMismatch` unless exactly one resource is bound per
    /// required name.
    pub fn execute(&self, pool: &ResourcePool) -> Result<ExecutionReport> {
        self.spec.ensure_bound()?;
        info!(
            task = %self.spec.name(),
            "Executing task {}: {} (Duration: {} units)",
            self.spec.name(),
            self.spec.description(),
            self.spec.duration_in_units()
        );
        let used = self.spec.use_resources(pool)?;
        Ok(ExecutionReport::leaf(self.spec.name(), used))
    }
}
