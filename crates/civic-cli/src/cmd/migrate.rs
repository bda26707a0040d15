use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use civic_core::logger::SessionLogger;
use civic_core::pipeline::PipelineRunner;
use civic_core::settings::SettingsStore;
use civic_core::{steps, subtheme, CivicError};

use crate::prompt::Prompter;

/// Validate configuration and subtheme, confirm, then run the default
/// migration sequence.
pub async fn run<R: BufRead, W: Write>(
    root: &Path,
    logger: &Arc<SessionLogger>,
    prompter: &mut Prompter<R, W>,
) -> anyhow::Result<()> {
    let store = SettingsStore::new(root);
    let verdict = store.validate()?;
    if !verdict.valid {
        return Err(CivicError::ConfigurationInvalid(verdict.message).into());
    }
    let settings = store.load()?;

    let report = subtheme::validate(&settings.subtheme_dir)?;
    logger.info(&report.message);
    report.into_result()?;

    let mut runner = PipelineRunner::new(steps::default_steps(root), Arc::clone(logger));
    writeln!(prompter.output(), "\nSteps to run in {}:", settings.subtheme_dir.display())?;
    for (i, step) in runner.steps().iter().enumerate() {
        writeln!(prompter.output(), "  {}. {}", i + 1, step.name)?;
    }
    match prompter.confirm("Start the migration?", true)? {
        Some(true) => {}
        Some(false) | None => {
            logger.info("Migration not started");
            return Ok(());
        }
    }

    runner
        .run(&settings)
        .await
        .context("migration aborted; steps before the failure were kept")?;
    Ok(())
}
