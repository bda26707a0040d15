mod cmd;
mod menu;
mod output;
mod prompt;
mod root;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use civic_core::logger::SessionLogger;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "civic-migrate",
    about = "Interactive helper that migrates a CivicTheme subtheme to the current CivicTheme release",
    long_about = "Interactive helper that migrates a CivicTheme subtheme to the current CivicTheme release.\n\n\
                  Settings are kept in <root>/.env and session logs in <root>/logs, where <root> is \
                  $CIVIC_MIGRATE_ROOT or the nearest directory holding scripts/update-storybook.sh.",
    version
)]
struct Cli {}

fn main() {
    let _cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let explicit = std::env::var_os(root::ENV_ROOT).map(PathBuf::from);
    let root = root::resolve_root(explicit.as_deref());

    if let Err(e) = run(root) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(root: PathBuf) -> anyhow::Result<()> {
    let logger = Arc::new(SessionLogger::for_root(&root));
    let log_file = logger
        .init()
        .with_context(|| format!("cannot start session log in {}", logger.dir().display()))?;
    tracing::debug!(root = %root.display(), log = %log_file.display(), "session started");

    let rt = tokio::runtime::Runtime::new().context("cannot start async runtime")?;
    let stdin = std::io::stdin();
    let mut prompter = prompt::Prompter::new(stdin.lock(), std::io::stdout());
    let result = rt.block_on(menu::run_session(&root, &logger, &mut prompter));

    logger.close();
    result
}
