//! Execution layer - plan loading and the process run queue.

#![warn(missing_docs)]

pub mod plan;
pub mod engine;

pub use plan::{Plan, ProcessPlan, TaskPlan, ResourcePlan, ExecutablePlan, PlanError};
pub use engine::{ExecutionEngine, EngineConfig};
