use std::io::Write;
use std::path::Path;

use civic_core::logger::SessionLogger;
use civic_core::settings::SettingsStore;

use crate::output::write_table;

/// Print the stored settings with the API key masked.
pub fn run(root: &Path, logger: &SessionLogger, out: &mut impl Write) -> anyhow::Result<()> {
    let store = SettingsStore::new(root);
    let settings = store.load()?;

    let subtheme = if settings.subtheme_dir.as_os_str().is_empty() {
        "(not set)".to_string()
    } else {
        settings.subtheme_dir.display().to_string()
    };
    let log = logger
        .current_log_file()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string());

    writeln!(out)?;
    write_table(
        out,
        &["Setting", "Value"],
        &[
            vec!["Settings file".into(), store.path().display().to_string()],
            vec!["Subtheme directory".into(), subtheme],
            vec!["Anthropic API key".into(), settings.masked_api_key()],
            vec!["Model".into(), settings.model.clone()],
            vec!["Session log".into(), log],
        ],
    )?;

    let verdict = store.validate()?;
    writeln!(out, "\n{}", verdict.message)?;
    Ok(())
}
