use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;

use super::exec::{self, ProcessOutput};
use super::report::{format_duration, progress_bar, RunReport, StepResult};
use super::step::{RunState, Step, StepContext, StepState, StepTarget};
use crate::error::{CivicError, Result};
use crate::logger::{Level, SessionLogger};
use crate::settings::Settings;

/// Step stdout shorter than this is echoed to the console after success.
pub const CONSOLE_OUTPUT_LIMIT: usize = 500;

/// Environment variable carrying the active session log path to steps.
pub const ENV_LOG_FILE: &str = "CIVIC_MIGRATE_LOG";

const PROGRESS_WIDTH: usize = 30;

/// Why a step did not succeed, plus whatever output it produced first.
struct StepFailure {
    message: String,
    stdout: String,
    stderr: String,
}

impl StepFailure {
    fn bare(message: impl Into<String>) -> Self {
        StepFailure {
            message: message.into(),
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

struct Captured {
    stdout: String,
    stderr: String,
}

// ---------------------------------------------------------------------------
// PipelineRunner
// ---------------------------------------------------------------------------

/// Runs an ordered list of steps, strictly one after another, stopping at
/// the first failure. Every run starts from step 1.
#[derive(Debug)]
pub struct PipelineRunner {
    steps: Vec<Step>,
    logger: Arc<SessionLogger>,
    states: Vec<StepState>,
    run_state: RunState,
    results: Vec<StepResult>,
}

impl PipelineRunner {
    pub fn new(steps: Vec<Step>, logger: Arc<SessionLogger>) -> Self {
        let states = vec![StepState::Pending; steps.len()];
        PipelineRunner {
            steps,
            logger,
            states,
            run_state: RunState::Idle,
            results: Vec::new(),
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn states(&self) -> &[StepState] {
        &self.states
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Results of the most recent run, including the failed step if it aborted.
    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    /// Execute every step in order with `settings` as their environment.
    ///
    /// Returns `StepExecutionFailed` naming the first step that failed;
    /// effects of steps that already completed are left in place.
    pub async fn run(&mut self, settings: &Settings) -> Result<RunReport> {
        let total = self.steps.len();
        self.states = vec![StepState::Pending; total];
        self.results.clear();

        let env = self.step_env(settings);
        let started = Instant::now();
        self.logger.info(format!("Starting migration: {total} step(s)"));

        for i in 0..total {
            let index = i + 1;
            let step = self.steps[i].clone();
            self.run_state = RunState::Running { step: index, total };
            self.states[i] = StepState::Running;

            self.logger
                .info(format!("Step {index}/{total}: {}", step.name));
            self.logger.info(format!("  {}", step.description));
            self.logger
                .console_only(Level::Info, progress_bar(index, total, PROGRESS_WIDTH));
            tracing::debug!(step = %step.id, kind = step.target.kind(), "dispatching step");

            let started_at = Local::now();
            let clock = Instant::now();
            let outcome = self.execute(&step, index, total, settings, &env).await;
            let duration = clock.elapsed();
            let finished_at = Local::now();

            match outcome {
                Ok(out) => {
                    self.states[i] = StepState::Succeeded;
                    self.logger.success(format!(
                        "{} completed in {}",
                        step.name,
                        format_duration(duration)
                    ));
                    self.report_output(&out.stdout, &out.stderr);
                    self.results.push(StepResult {
                        step_id: step.id.clone(),
                        step_name: step.name.clone(),
                        started_at,
                        finished_at,
                        duration,
                        stdout: out.stdout,
                        stderr: out.stderr,
                        success: true,
                        error: None,
                    });
                }
                Err(failure) => {
                    self.states[i] = StepState::Failed;
                    self.run_state = RunState::Aborted { step: index };
                    self.logger.error(format!(
                        "Step {index}/{total} ({}) failed after {}: {}",
                        step.name,
                        format_duration(duration),
                        failure.message
                    ));
                    self.log_full_output(&failure.stdout, &failure.stderr);
                    let skipped = total - index;
                    if skipped > 0 {
                        self.logger
                            .warning(format!("Aborting: {skipped} remaining step(s) not run"));
                    }
                    self.results.push(StepResult {
                        step_id: step.id.clone(),
                        step_name: step.name.clone(),
                        started_at,
                        finished_at,
                        duration,
                        stdout: failure.stdout,
                        stderr: failure.stderr,
                        success: false,
                        error: Some(failure.message.clone()),
                    });
                    return Err(CivicError::StepExecutionFailed {
                        index,
                        name: step.name,
                        message: failure.message,
                    });
                }
            }
        }

        self.run_state = RunState::Completed;
        let report = RunReport {
            results: self.results.clone(),
            total: started.elapsed(),
        };
        self.log_summary(&report);
        Ok(report)
    }

    /// The single dispatch point over step targets.
    async fn execute(
        &self,
        step: &Step,
        index: usize,
        total: usize,
        settings: &Settings,
        env: &[(String, String)],
    ) -> std::result::Result<Captured, StepFailure> {
        if step.needs_api_key && settings.api_key.trim().is_empty() {
            return Err(StepFailure::bare(
                "an Anthropic API key is required for this step",
            ));
        }

        let cwd = settings.subtheme_dir.as_path();
        let output = match &step.target {
            StepTarget::Shell(script) => {
                require_script(script)?;
                exec::run_captured(exec::shell_command(script), cwd, env).await
            }
            StepTarget::Interpreted(script) => {
                require_script(script)?;
                let runtime = exec::detect_runtime().ok_or_else(|| {
                    StepFailure::bare("no JavaScript runtime found (install bun, deno or node)")
                })?;
                tracing::debug!(runtime = runtime.name(), "running script step");
                exec::run_captured(exec::interpreted_command(runtime, script), cwd, env).await
            }
            StepTarget::InProcess(handle) => {
                let ctx = StepContext {
                    index,
                    total,
                    settings: settings.clone(),
                    logger: Arc::clone(&self.logger),
                };
                return handle
                    .call(ctx)
                    .await
                    .map(|stdout| Captured {
                        stdout,
                        stderr: String::new(),
                    })
                    .map_err(|e| StepFailure::bare(e.to_string()));
            }
        };

        let output = output.map_err(|e| StepFailure::bare(format!("could not start: {e}")))?;
        self.check_exit(output)
    }

    fn check_exit(&self, output: ProcessOutput) -> std::result::Result<Captured, StepFailure> {
        if output.truncated {
            self.logger.warning(format!(
                "Step output exceeded {} bytes and was truncated",
                exec::MAX_OUTPUT_BYTES
            ));
        }
        if output.status.success() {
            return Ok(Captured {
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        let mut message = match output.status.code() {
            Some(code) => format!("exited with code {code}"),
            None => "terminated by signal".to_string(),
        };
        let detail = tail(output.stderr.trim(), 1000);
        if !detail.is_empty() {
            message.push_str(": ");
            message.push_str(detail);
        }
        Err(StepFailure {
            message,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn step_env(&self, settings: &Settings) -> Vec<(String, String)> {
        let mut env = settings.step_env();
        if let Some(log) = self.logger.current_log_file() {
            env.push((ENV_LOG_FILE.to_string(), log.to_string_lossy().into_owned()));
        }
        env
    }

    fn report_output(&self, stdout: &str, stderr: &str) {
        if let Some(line) = console_output_line(stdout, &self.logger.log_hint()) {
            self.logger.console_only(Level::Info, line);
        }
        self.log_full_output(stdout, stderr);
    }

    fn log_full_output(&self, stdout: &str, stderr: &str) {
        if !stdout.is_empty() {
            self.logger
                .file_only(Level::Debug, format!("stdout:\n{}", stdout.trim_end()));
        }
        if !stderr.is_empty() {
            self.logger
                .file_only(Level::Debug, format!("stderr:\n{}", stderr.trim_end()));
        }
    }

    fn log_summary(&self, report: &RunReport) {
        self.logger.success(format!(
            "Migration completed: {}/{} steps succeeded ({:.0}%) in {}",
            report.succeeded(),
            report.results.len(),
            report.success_percentage(),
            format_duration(report.total)
        ));
        for row in report.breakdown() {
            self.logger.info(format!(
                "  {:<32} {:>10} {:>6.1}%",
                row.name,
                format_duration(row.duration),
                row.percent
            ));
        }
    }
}

/// What the console shows of a successful step's stdout: the text itself
/// when shorter than [`CONSOLE_OUTPUT_LIMIT`], otherwise just its size and
/// `log_hint`. `None` for blank output.
pub(crate) fn console_output_line(stdout: &str, log_hint: &str) -> Option<String> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }
    if stdout.len() < CONSOLE_OUTPUT_LIMIT {
        Some(format!("Output:\n{trimmed}"))
    } else {
        Some(format!("Output: {} bytes{log_hint}", stdout.len()))
    }
}

fn require_script(script: &Path) -> std::result::Result<(), StepFailure> {
    if script.is_file() {
        Ok(())
    } else {
        Err(StepFailure::bare(format!(
            "script not found: {}",
            script.display()
        )))
    }
}

/// Last `max` bytes of `s`, on a char boundary.
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
