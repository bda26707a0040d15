use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use civic_core::logger::{Level, SessionLogger};
use civic_core::settings::{Settings, SettingsStore, DEFAULT_MODEL};
use civic_core::subtheme;

use crate::prompt::Prompter;

/// Configuration wizard. Current values are offered as defaults; end of
/// input at any prompt cancels without saving.
pub fn run<R: BufRead, W: Write>(
    root: &Path,
    logger: &SessionLogger,
    prompter: &mut Prompter<R, W>,
) -> anyhow::Result<()> {
    let store = SettingsStore::new(root);
    let current = store
        .load()
        .with_context(|| format!("cannot read {}", store.path().display()))?;

    let Some(subtheme_dir) = ask_subtheme_dir(&current, logger, prompter)? else {
        return cancelled(logger);
    };

    let key_default = if current.api_key.is_empty() {
        None
    } else {
        Some(current.masked_api_key())
    };
    let Some(answer) = prompter.ask("Anthropic API key", key_default.as_deref())? else {
        return cancelled(logger);
    };
    // The masked default stands for "keep the current key".
    let api_key = if key_default.as_deref() == Some(answer.as_str()) {
        current.api_key.clone()
    } else {
        answer
    };
    if api_key.is_empty() {
        logger.warning("No API key given: schema generation will be unavailable");
    }

    let model_default = if current.model.is_empty() {
        DEFAULT_MODEL
    } else {
        current.model.as_str()
    };
    let Some(model) = prompter.ask("Claude model", Some(model_default))? else {
        return cancelled(logger);
    };

    let settings = Settings::new(subtheme_dir, api_key, model);
    store
        .save(&settings)
        .with_context(|| format!("cannot write {}", store.path().display()))?;
    logger.success(format!("Configuration saved to {}", store.path().display()));

    let verdict = store.validate()?;
    if verdict.valid {
        logger.success(verdict.message);
    } else {
        logger.warning(verdict.message);
    }
    Ok(())
}

/// Prompt until the directory is a CivicTheme subtheme or the user accepts
/// a non-conforming one.
fn ask_subtheme_dir<R: BufRead, W: Write>(
    current: &Settings,
    logger: &SessionLogger,
    prompter: &mut Prompter<R, W>,
) -> anyhow::Result<Option<PathBuf>> {
    let default = current.subtheme_dir.to_string_lossy().into_owned();
    loop {
        let Some(answer) = prompter.ask("Subtheme directory", Some(&default))? else {
            return Ok(None);
        };
        if answer.is_empty() {
            logger.console_only(Level::Warning, "A subtheme directory is required");
            continue;
        }

        let dir = absolutize(Path::new(&answer))?;
        if !dir.is_dir() {
            logger.warning(format!("{} is not a directory", dir.display()));
            continue;
        }

        let report = subtheme::validate(&dir)?;
        if report.is_valid() {
            logger.info(&report.message);
            return Ok(Some(dir));
        }
        logger.warning(&report.message);
        let question = "This does not look like a CivicTheme subtheme. Use it anyway?";
        match prompter.confirm(question, false)? {
            None => return Ok(None),
            Some(true) => return Ok(Some(dir)),
            Some(false) => continue,
        }
    }
}

fn absolutize(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    Ok(cwd.join(path))
}

fn cancelled(logger: &SessionLogger) -> anyhow::Result<()> {
    logger.warning("Configuration cancelled, nothing saved");
    Ok(())
}
