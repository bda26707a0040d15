//! Ordered, fail-fast migration pipeline.
//!
//! ```text
//! Step (descriptor) ──► PipelineRunner::run ──► exec (bash / JS runtime)
//!                              │            └──► InProcessStep future
//!                              ▼
//!                       SessionLogger + RunReport
//! ```
//!
//! Per step: `Pending → Running → {Succeeded, Failed}`.
//! Per run:  `Idle → Running(i of N) → {Completed, Aborted}`.

pub mod exec;
pub mod report;
pub mod runner;
pub mod step;

pub use report::{format_duration, progress_bar, RunReport, StepResult, TimingRow};
pub use runner::{PipelineRunner, CONSOLE_OUTPUT_LIMIT, ENV_LOG_FILE};
pub use step::{InProcessStep, RunState, Step, StepContext, StepState, StepTarget};
