use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::Result;
use crate::logger::SessionLogger;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// In-process steps
// ---------------------------------------------------------------------------

/// What an in-process step receives when it runs.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// 1-based position of the step in the pipeline.
    pub index: usize,
    pub total: usize,
    pub settings: Settings,
    pub logger: Arc<SessionLogger>,
}

/// Shared handle to an async function run as a pipeline step. The returned
/// string plays the role of the step's stdout.
#[derive(Clone)]
pub struct InProcessStep(Arc<dyn Fn(StepContext) -> BoxFuture<'static, Result<String>> + Send + Sync>);

impl InProcessStep {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        InProcessStep(Arc::new(
            move |ctx| -> BoxFuture<'static, Result<String>> { Box::pin(f(ctx)) },
        ))
    }

    pub(crate) fn call(&self, ctx: StepContext) -> BoxFuture<'static, Result<String>> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for InProcessStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InProcessStep(..)")
    }
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// How a step is invoked. The runner dispatches on this in one place.
#[derive(Debug, Clone)]
pub enum StepTarget {
    /// Shell script, run with `bash <path>`.
    Shell(PathBuf),
    /// JavaScript module, run with the best available JS runtime.
    Interpreted(PathBuf),
    InProcess(InProcessStep),
}

impl StepTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            StepTarget::Shell(_) => "shell",
            StepTarget::Interpreted(_) => "script",
            StepTarget::InProcess(_) => "in-process",
        }
    }
}

/// Immutable descriptor of one pipeline step.
#[derive(Debug, Clone)]
pub struct Step {
    pub id: String,
    pub name: String,
    pub description: String,
    pub target: StepTarget,
    /// The step calls the AI service and cannot run without an API key.
    pub needs_api_key: bool,
}

impl Step {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        target: StepTarget,
    ) -> Self {
        Step {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            target,
            needs_api_key: false,
        }
    }

    pub fn needs_api_key(mut self) -> Self {
        self.needs_api_key = true;
        self
    }
}

// ---------------------------------------------------------------------------
// State machines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// 1-based step currently executing.
    Running { step: usize, total: usize },
    Completed,
    /// 1-based step that failed.
    Aborted { step: usize },
}
