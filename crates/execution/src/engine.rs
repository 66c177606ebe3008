//! The execution engine - drives a queue of top-level processes.

use std::collections::VecDeque;
use tracing::{debug, info, warn};
use workpool_core::{Process, RunReport};

/// Configuration for the execution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Max runs before stopping (None = drain the queue)
    pub max_runs: Option<usize>,
    /// Stop after the first unsuccessful run
    pub stop_on_failure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_runs: None,
            stop_on_failure: false,
        }
    }
}

/// The execution engine.
///
/// Runs queued processes one at a time, in the order they were enqueued:
/// ```text
/// Dequeue → Process::run → Record report
/// ```
/// A failed or skipped process never aborts the engine unless
/// [`EngineConfig::stop_on_failure`] is set.
#[derive(Debug, Default)]
pub struct ExecutionEngine {
    queue: VecDeque<Process>,
    finished: Vec<Process>,
    config: EngineConfig,
    runs: usize,
}

impl ExecutionEngine {
    /// Create a new execution engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Queue a process.
    pub fn enqueue(&mut self, process: Process) {
        debug!(process = %process.name(), "Enqueued process");
        self.queue.push_back(process);
    }

    /// Processes still waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Processes that have already run, in run order.
    pub fn finished(&self) -> &[Process] {
        &self.finished
    }

    /// Run the next queued process.
    pub fn run_next(&mut self) -> Option<RunReport> {
        let mut process = self.queue.pop_front()?;
        info!("Starting run {} ({})", self.runs + 1, process.name());

        let report = process.run();
        self.runs += 1;
        self.finished.push(process);
        Some(report)
    }

    /// Run queued processes until the queue drains or the config says stop.
    pub fn run(&mut self) -> Vec<RunReport> {
        let mut reports = Vec::new();

        loop {
            if let Some(max) = self.config.max_runs {
                if self.runs >= max {
                    info!("Reached max runs ({})", max);
                    break;
                }
            }

            let Some(report) = self.run_next() else {
                info!("No more processes to run");
                break;
            };

            let failed = !report.is_success();
            reports.push(report);

            if failed && self.config.stop_on_failure {
                warn!("Stopping after unsuccessful run");
                break;
            }
        }

        reports
    }

    /// Get runs executed so far.
    pub fn runs(&self) -> usize {
        self.runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workpool_core::{Resource, Task};

    fn ok_process(name: &str) -> Process {
        let mut p = Process::new(name, "", Vec::<String>::new(), 1).unwrap();
        p.add_resource(Resource::usable("CPU", 1.0).unwrap());
        p.add_task(Task::new("t", "", ["CPU"], 1).unwrap());
        p
    }

    fn starved_process(name: &str) -> Process {
        Process::new(name, "", ["GPU"], 1).unwrap()
    }

    #[test]
    fn test_runs_in_fifo_order() {
        let mut engine = ExecutionEngine::new();
        engine.enqueue(ok_process("a"));
        engine.enqueue(ok_process("b"));

        let reports = engine.run();
        let names: Vec<_> = reports.iter().map(|r| r.process.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(engine.runs(), 2);
        assert_eq!(engine.pending(), 0);
        assert_eq!(engine.finished().len(), 2);
    }

    #[test]
    fn test_failed_run_does_not_stop_engine() {
        let mut engine = ExecutionEngine::new();
        engine.enqueue(starved_process("a"));
        engine.enqueue(ok_process("b"));

        let reports = engine.run();
        assert_eq!(reports.len(), 2);
        assert!(!reports[0].is_success());
        assert!(reports[1].is_success());
    }

    #[test]
    fn test_stop_on_failure() {
        let mut engine = ExecutionEngine::new().with_config(EngineConfig {
            max_runs: None,
            stop_on_failure: true,
        });
        engine.enqueue(starved_process("a"));
        engine.enqueue(ok_process("b"));

        let reports = engine.run();
        assert_eq!(reports.len(), 1);
        assert_eq!(engine.pending(), 1);
    }

    #[test]
    fn test_max_runs() {
        let mut engine = ExecutionEngine::new().with_config(EngineConfig {
            max_runs: Some(1),
            ..Default::default()
        });
        engine.enqueue(ok_process("a"));
        engine.enqueue(ok_process("b"));

        assert_eq!(engine.run().len(), 1);
        assert_eq!(engine.pending(), 1);
        assert!(engine.run_next().is_some());
        assert!(engine.run_next().is_none());
    }
}
