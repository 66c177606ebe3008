//! Executable model - named units of work and their resource bindings.

use crate::error::{Error, Result};
use crate::pool::{ResourceHandle, ResourcePool};
use crate::process::Process;
use crate::report::ExecutionReport;
use crate::task::Task;
use tracing::{debug, warn};

/// State shared by every executable: identity, requirements and the
/// resources bound for the current run.
#[derive(Debug, Clone)]
pub struct ExecutableSpec {
    name: String,
    description: String,
    required_resources: Vec<String>,
    duration_in_units: u64,
    assigned: Vec<ResourceHandle>,
}

impl ExecutableSpec {
    /// Validate and create a spec.
    ///
    /// Duplicate entries in `required_resources` each take one allocation.
    /// A usable lock can only be taken once, so duplicates need distinct
    /// usable instances; a consumable instance with units left can satisfy
    /// several duplicates, one unit each.
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
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        let duration = match u64::try_from(duration_in_units) {
            Ok(d) if d > 0 => d,
            _ => {
                return Err(Error::InvalidDuration {
                    name,
                    duration: duration_in_units,
                })
            }
        };
        Ok(Self {
            name,
            description: description.into(),
            required_resources: required_resources.into_iter().map(Into::into).collect(),
            duration_in_units: duration,
            assigned: Vec::new(),
        })
    }

    /// Executable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Required resource names, in declaration order.
    pub fn required_resources(&self) -> &[String] {
        &self.required_resources
    }

    /// Descriptive duration. Nothing waits on it.
    pub fn duration_in_units(&self) -> u64 {
        self.duration_in_units
    }

    /// Handles bound by the last successful [`assign_resources`](Self::assign_resources).
    pub fn assigned(&self) -> &[ResourceHandle] {
        &self.assigned
    }

    /// Bind one free pool instance per required name, first-fit in pool order.
    ///
    /// Any previous binding is dropped without being released; callers
    /// release before rebinding. On failure everything bound by this call is
    /// released again and nothing stays assigned.
    pub fn assign_resources(&mut self, pool: &mut ResourcePool) -> Result<()> {
        self.assigned.clear();

        for i in 0..self.required_resources.len() {
            let wanted = &self.required_resources[i];
            let bound = pool
                .find_available(wanted)
                .ok_or_else(|| Error::ResourceUnavailable(wanted.clone()))
                .and_then(|handle| {
                    pool.resolve_mut(handle)?.allocate()?;
                    Ok(handle)
                });

            match bound {
                Ok(handle) => {
                    debug!(executable = %self.name, resource = %wanted, %handle, "Bound resource");
                    self.assigned.push(handle);
                }
                Err(e) => {
                    self.release_resources(pool);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Release every bound resource, then clear the binding.
    ///
    /// Best effort: a handle that no longer resolves is logged and skipped.
    pub fn release_resources(&mut self, pool: &mut ResourcePool) {
        for handle in self.assigned.drain(..) {
            match pool.get_mut(handle) {
                Some(resource) => {
                    let status = resource.release();
                    debug!(executable = %self.name, resource = %resource.name(), ?status, "Released resource");
                }
                None => {
                    warn!(
                        executable = %self.name,
                        %handle,
                        "Failed to release resource: {}",
                        Error::StaleHandle(handle.index())
                    );
                }
            }
        }
    }

    /// Every required name has at least one free instance right now.
    ///
    /// Reserves nothing.
    pub fn can_execute(&self, pool: &ResourcePool) -> bool {
        self.required_resources
            .iter()
            .all(|name| pool.has_available(name))
    }

    pub(crate) fn ensure_bound(&self) -> Result<()> {
        if self.assigned.len() != self.required_resources.len() {
            return Err(Error::BindingMismatch {
                executable: self.name.clone(),
                required: self.required_resources.len(),
                bound: self.assigned.len(),
            });
        }
        Ok(())
    }

    /// Call `use` on each bound resource in order, returning their names.
    pub(crate) fn use_resources(&self, pool: &ResourcePool) -> Result<Vec<String>> {
        let mut used = Vec::with_capacity(self.assigned.len());
        for handle in &self.assigned {
            let resource = pool.resolve(*handle)?;
            resource.use_resource();
            used.push(resource.name().to_string());
        }
        Ok(used)
    }
}

/// A unit of work: a leaf task or a composite process.
#[derive(Debug)]
pub enum Executable {
    /// Leaf work
    Task(Task),
    /// Composite work with its own pool
    Process(Process),
}

impl Executable {
    /// Shared executable state.
    pub fn spec(&self) -> &ExecutableSpec {
        match self {
            Executable::Task(t) => t.spec(),
            Executable::Process(p) => p.spec(),
        }
    }

    fn spec_mut(&mut self) -> &mut ExecutableSpec {
        match self {
            Executable::Task(t) => t.spec_mut(),
            Executable::Process(p) => p.spec_mut(),
        }
    }

    /// Executable name.
    pub fn name(&self) -> &str {
        self.spec().name()
    }

    /// See [`ExecutableSpec::can_execute`].
    pub fn can_execute(&self, pool: &ResourcePool) -> bool {
        self.spec().can_execute(pool)
    }

    /// See [`ExecutableSpec::assign_resources`].
    pub fn assign_resources(&mut self, pool: &mut ResourcePool) -> Result<()> {
        self.spec_mut().assign_resources(pool)
    }

    /// See [`ExecutableSpec::release_resources`].
    pub fn release_resources(&mut self, pool: &mut ResourcePool) {
        self.spec_mut().release_resources(pool)
    }

    /// Run the body against resources bound from `pool`.
    ///
    /// A process drives its own children against its own pool.
    pub fn execute(&mut self, pool: &ResourcePool) -> Result<ExecutionReport> {
        match self {
            Executable::Task(t) => t.execute(pool),
            Executable::Process(p) => p.execute_nested(pool),
        }
    }
}

impl From<Task> for Executable {
    fn from(task: Task) -> Self {
        Executable::Task(task)
    }
}

impl From<Process> for Executable {
    fn from(process: Process) -> Self {
        Executable::Process(process)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Resource;

    fn spec(required: &[&str]) -> ExecutableSpec {
        ExecutableSpec::new("t", "test", required.iter().copied(), 1).unwrap()
    }

    #[test]
    fn test_spec_validation() {
        assert_eq!(
            ExecutableSpec::new("", "d", Vec::<String>::new(), 1).unwrap_err(),
            Error::InvalidName
        );
        assert_eq!(
            ExecutableSpec::new("t", "d", Vec::<String>::new(), 0).unwrap_err(),
            Error::InvalidDuration { name: "t".into(), duration: 0 }
        );
        assert!(ExecutableSpec::new("t", "d", Vec::<String>::new(), -5).is_err());
    }

    #[test]
    fn test_assign_first_fit() {
        let mut pool = ResourcePool::new();
        let first = pool.add(Resource::usable("CPU", 1.0).unwrap());
        pool.add(Resource::usable("CPU", 2.0).unwrap());

        let mut s = spec(&["CPU"]);
        s.assign_resources(&mut pool).unwrap();
        assert_eq!(s.assigned(), &[first]);
        assert!(!pool.get(first).unwrap().is_available_for_use());
    }

    #[test]
    fn test_duplicates_need_distinct_instances() {
        let mut pool = ResourcePool::new();
        let a = pool.add(Resource::usable("CPU", 1.0).unwrap());
        let b = pool.add(Resource::usable("CPU", 1.0).unwrap());

        let mut s = spec(&["CPU", "CPU"]);
        s.assign_resources(&mut pool).unwrap();
        assert_eq!(s.assigned(), &[a, b]);
    }

    #[test]
    fn test_duplicates_share_consumable_units() {
        let mut pool = ResourcePool::new();
        let mem = pool.add(Resource::consumable("Mem", 2).unwrap());

        let mut s = spec(&["Mem", "Mem"]);
        s.assign_resources(&mut pool).unwrap();
        assert_eq!(s.assigned(), &[mem, mem]);
        assert_eq!(s.use_resources(&pool).unwrap(), vec!["Mem", "Mem"]);
        match pool.get(mem).unwrap() {
            Resource::Consumable(m) => assert_eq!(m.remaining_capacity(), 0),
            other => panic!("unexpected resource {other:?}"),
        }

        let mut again = spec(&["Mem"]);
        assert_eq!(
            again.assign_resources(&mut pool).unwrap_err(),
            Error::ResourceUnavailable("Mem".into())
        );
    }

    #[test]
    fn test_assign_failure_rolls_back() {
        let mut pool = ResourcePool::new();
        let cpu = pool.add(Resource::usable("CPU", 1.0).unwrap());

        let mut s = spec(&["CPU", "GPU"]);
        assert_eq!(
            s.assign_resources(&mut pool).unwrap_err(),
            Error::ResourceUnavailable("GPU".into())
        );
        assert!(s.assigned().is_empty());
        assert!(pool.get(cpu).unwrap().is_available_for_use());
    }

    #[test]
    fn test_release_clears_binding() {
        let mut pool = ResourcePool::new();
        let cpu = pool.add(Resource::usable("CPU", 1.0).unwrap());
        let mem = pool.add(Resource::consumable("Mem", 2).unwrap());

        let mut s = spec(&["CPU", "Mem"]);
        s.assign_resources(&mut pool).unwrap();
        s.release_resources(&mut pool);

        assert!(s.assigned().is_empty());
        assert!(pool.get(cpu).unwrap().is_available_for_use());
        match pool.get(mem).unwrap() {
            Resource::Consumable(m) => assert_eq!(m.remaining_capacity(), 1),
            other => panic!("unexpected resource {other:?}"),
        }
    }

    #[test]
    fn test_release_skips_stale_handles() {
        let mut big = ResourcePool::new();
        big.add(Resource::usable("A", 1.0).unwrap());
        big.add(Resource::usable("B", 1.0).unwrap());

        let mut s = spec(&["B"]);
        s.assign_resources(&mut big).unwrap();

        let mut small = ResourcePool::new();
        small.add(Resource::usable("A", 1.0).unwrap());
        s.release_resources(&mut small);
        assert!(s.assigned().is_empty());
    }

    #[test]
    fn test_can_execute() {
        let mut pool = ResourcePool::new();
        let cpu = pool.add(Resource::usable("CPU", 1.0).unwrap());

        assert!(spec(&[]).can_execute(&pool));
        assert!(spec(&["CPU"]).can_execute(&pool));
        assert!(!spec(&["CPU", "GPU"]).can_execute(&pool));

        pool.get_mut(cpu).unwrap().allocate().unwrap();
        assert!(!spec(&["CPU"]).can_execute(&pool));
    }

    #[test]
    fn test_ensure_bound() {
        let s = spec(&["CPU"]);
        assert_eq!(
            s.ensure_bound().unwrap_err(),
            Error::BindingMismatch { executable: "t".into(), required: 1, bound: 0 }
        );
        assert!(spec(&[]).ensure_bound().is_ok());
    }
}
