//! Workpool CLI - run processes against finite resource pools.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use workpool_core::{
    ChildStatus, ConsumableResource, Executable, ExecutionReport, Process, Resource, RunOutcome,
    RunReport, Task, UsableResource,
};
use workpool_execution::{EngineConfig, ExecutionEngine, Plan};

#[derive(Parser)]
#[command(name = "workpool")]
#[command(about = "Run processes and tasks against a finite resource pool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every process in a plan file
    Run {
        /// Plan file (JSON)
        plan: PathBuf,
        /// Print run reports as JSON
        #[arg(long)]
        json: bool,
        /// Stop after this many runs
        #[arg(long)]
        max_runs: Option<usize>,
        /// Stop after the first unsuccessful run
        #[arg(long)]
        stop_on_failure: bool,
    },
    /// Build a plan without running it
    Validate {
        /// Plan file (JSON)
        plan: PathBuf,
    },
    /// Run the built-in compile scenario
    Demo {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let reports = match cli.command {
        Commands::Run { plan, json, max_runs, stop_on_failure } => {
            let processes = Plan::load(&plan)
                .and_then(|p| p.build())
                .with_context(|| format!("loading plan {}", plan.display()))?;

            let mut engine = ExecutionEngine::new().with_config(EngineConfig {
                max_runs,
                stop_on_failure,
            });
            for process in processes {
                engine.enqueue(process);
            }

            let reports = engine.run();
            info!("Completed {} runs", engine.runs());
            print_reports(&reports, json)?;
            reports
        }
        Commands::Validate { plan } => {
            let processes = Plan::load(&plan)
                .and_then(|p| p.build())
                .with_context(|| format!("loading plan {}", plan.display()))?;

            println!("Plan OK ({} processes)", processes.len());
            for process in &processes {
                print_process(process, 1);
            }
            return Ok(());
        }
        Commands::Demo { json } => {
            let mut process = compile_scenario()?;
            let report = process.run();
            print_reports(std::slice::from_ref(&report), json)?;
            vec![report]
        }
    };

    if reports.iter().any(|r| !r.is_success()) {
        std::process::exit(1);
    }
    Ok(())
}

fn compile_scenario() -> workpool_core::Result<Process> {
    let mut process = Process::new("CompileMain", "Compile main.cpp", ["CentralProcessingUnit", "Memory"], 15)?;
    process.add_resource(UsableResource::new("CentralProcessingUnit", 3.0)?);
    process.add_resource(ConsumableResource::new("Memory", 4096)?);
    process.add_task(Task::new(
        "ScanSourceCode",
        "Tokenize main.cpp",
        ["CentralProcessingUnit", "Memory"],
        2,
    )?);
    Ok(process)
}

fn print_reports(reports: &[RunReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    for report in reports {
        println!("Run {} | {}", report.run_id, report.process);
        match &report.outcome {
            RunOutcome::Completed(execution) => {
                println!("  COMPLETED");
                print_execution(execution, 2);
            }
            RunOutcome::Skipped { reason } => println!("  SKIPPED: {}", reason),
            RunOutcome::Errored { error, .. } => println!("  ERROR: {}", error),
        }
    }
    Ok(())
}

fn print_execution(report: &ExecutionReport, depth: usize) {
    let pad = "  ".repeat(depth);
    if !report.used.is_empty() {
        println!("{}used: {}", pad, report.used.join(", "));
    }
    for child in &report.children {
        match &child.status {
            ChildStatus::Executed(nested) => {
                println!("{}{}: EXECUTED", pad, child.name);
                print_execution(nested, depth + 1);
            }
            ChildStatus::Skipped => println!("{}{}: SKIPPED", pad, child.name),
            ChildStatus::Failed { error, .. } => println!("{}{}: FAILED ({})", pad, child.name, error),
        }
    }
}

fn describe_resource(resource: &Resource) -> String {
    let capacity = match resource {
        Resource::Usable(r) => r.capacity().to_string(),
        Resource::Consumable(r) => r.total_capacity().to_string(),
    };
    format!("{} {} ({})", resource.kind().as_str(), resource.name(), capacity)
}

fn print_process(process: &Process, depth: usize) {
    let pad = "  ".repeat(depth);
    let spec = process.spec();
    println!(
        "{}process {} requires [{}] ({} units)",
        pad,
        spec.name(),
        spec.required_resources().join(", "),
        spec.duration_in_units()
    );
    for resource in process.pool().iter() {
        println!("{}  {}", pad, describe_resource(resource));
    }
    for child in process.children() {
        match child {
            Executable::Task(t) => println!(
                "{}  task {} requires [{}]",
                pad,
                t.name(),
                t.spec().required_resources().join(", ")
            ),
            Executable::Process(p) => print_process(p, depth + 1),
        }
    }
}
