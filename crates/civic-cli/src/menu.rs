use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use civic_core::logger::{Level, SessionLogger};
use civic_core::settings::SettingsStore;
use colored::Colorize;

use crate::cmd;
use crate::prompt::Prompter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    RunMigration,
    Configure,
    ShowConfiguration,
    Exit,
}

impl MenuItem {
    pub const ALL: [MenuItem; 4] = [
        MenuItem::RunMigration,
        MenuItem::Configure,
        MenuItem::ShowConfiguration,
        MenuItem::Exit,
    ];

    /// Fixed menu number, stable whether or not the item is offered.
    pub fn key(&self) -> u8 {
        match self {
            MenuItem::RunMigration => 1,
            MenuItem::Configure => 2,
            MenuItem::ShowConfiguration => 3,
            MenuItem::Exit => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::RunMigration => "Run migration",
            MenuItem::Configure => "Configure",
            MenuItem::ShowConfiguration => "Show configuration",
            MenuItem::Exit => "Exit",
        }
    }
}

/// Items on offer. Running needs a saved configuration.
pub fn menu_items(configured: bool) -> Vec<MenuItem> {
    MenuItem::ALL
        .into_iter()
        .filter(|item| configured || *item != MenuItem::RunMigration)
        .collect()
}

/// Match a typed answer against the offered items by number or label.
pub fn parse_choice(input: &str, items: &[MenuItem]) -> Option<MenuItem> {
    let input = input.trim();
    if let Ok(n) = input.parse::<u8>() {
        return items.iter().copied().find(|item| item.key() == n);
    }
    items
        .iter()
        .copied()
        .find(|item| item.label().eq_ignore_ascii_case(input))
}

fn render(out: &mut impl Write, items: &[MenuItem]) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "CivicTheme subtheme migration".bold())?;
    for item in items {
        writeln!(out, "  {}. {}", item.key(), item.label())?;
    }
    Ok(())
}

/// Menu loop. Returns when the user picks Exit or input runs out.
///
/// Errors raised by an action are logged and the menu is shown again; only
/// failures to talk to the terminal itself end the session with `Err`.
pub async fn run_session<R: BufRead, W: Write>(
    root: &Path,
    logger: &Arc<SessionLogger>,
    prompter: &mut Prompter<R, W>,
) -> anyhow::Result<()> {
    let store = SettingsStore::new(root);
    loop {
        let configured = match store.load() {
            Ok(settings) => settings.is_configured(),
            Err(e) => {
                logger.warning(format!("{e}"));
                false
            }
        };
        let items = menu_items(configured);
        render(prompter.output(), &items)?;
        if !configured {
            writeln!(
                prompter.output(),
                "  {}",
                "(not configured yet: choose Configure to enable Run migration)".dimmed()
            )?;
        }

        let Some(answer) = prompter.ask("Select an option", None)? else {
            tracing::debug!("stdin closed, leaving menu");
            return Ok(());
        };
        let Some(item) = parse_choice(&answer, &items) else {
            logger.console_only(Level::Warning, format!("Unknown option: {answer:?}"));
            continue;
        };

        let outcome = match item {
            MenuItem::RunMigration => cmd::migrate::run(root, logger, prompter).await,
            MenuItem::Configure => cmd::configure::run(root, logger, prompter),
            MenuItem::ShowConfiguration => cmd::show::run(root, logger, prompter.output()),
            MenuItem::Exit => {
                logger.info("Goodbye");
                return Ok(());
            }
        };

        if let Err(e) = outcome {
            logger.error(format!("{}: {e:#}", item.label()));
            logger.console_only(
                Level::Info,
                format!("Returning to the menu{}", logger.log_hint()),
            );
        }
    }
}
