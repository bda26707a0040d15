//! Per-session migration log.
//!
//! A [`SessionLogger`] owns one append-only file under `<tool root>/logs/`
//! for the lifetime of a CLI session and mirrors every entry to the console
//! with colour and an emoji tag. It is an explicit handle: create it, call
//! [`SessionLogger::init`], share it (usually behind an `Arc`) with whatever
//! needs to log, and [`SessionLogger::close`] it on the way out.
//!
//! There is no level filtering. Every entry that is not console-only is
//! persisted.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use chrono::Local;
use colored::{ColoredString, Colorize};

use crate::error::Result;
use crate::{io, paths};

/// Upper bound on session files kept in the log directory, including the
/// one being created.
pub const MAX_SESSION_LOGS: usize = 10;

const BANNER_RULE: &str = "============================================================";

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Success => "SUCCESS",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }

    fn emoji(&self) -> &'static str {
        match self {
            Level::Debug => "🔍",
            Level::Info => "ℹ️ ",
            Level::Success => "✅",
            Level::Warning => "⚠️ ",
            Level::Error => "❌",
        }
    }

    fn paint(&self, text: &str) -> ColoredString {
        match self {
            Level::Debug => text.dimmed(),
            Level::Info => text.cyan(),
            Level::Success => text.green(),
            Level::Warning => text.yellow(),
            Level::Error => text.red().bold(),
        }
    }
}

/// Where a single entry goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Both,
    ConsoleOnly,
    FileOnly,
}

// ---------------------------------------------------------------------------
// SessionLogger
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SessionLogger {
    dir: PathBuf,
    max_files: usize,
    current: Mutex<Option<PathBuf>>,
}

impl SessionLogger {
    /// Logger writing into `dir`. Nothing touches the disk until [`init`].
    ///
    /// [`init`]: SessionLogger::init
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SessionLogger {
            dir: dir.into(),
            max_files: MAX_SESSION_LOGS,
            current: Mutex::new(None),
        }
    }

    /// Logger for the tool root's standard `logs/` directory.
    pub fn for_root(root: &Path) -> Self {
        SessionLogger::new(paths::logs_dir(root))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Open a new session file, rotating old ones first.
    ///
    /// Calling `init` on an already initialised logger is a no-op returning
    /// the active path.
    pub fn init(&self) -> Result<PathBuf> {
        let mut current = self.lock();
        if let Some(path) = current.as_ref() {
            return Ok(path.clone());
        }

        io::ensure_dir(&self.dir)?;
        let failures = self.rotate();

        let path = self.fresh_session_path();
        let now = Local::now();
        let banner = format!(
            "{BANNER_RULE}\n CivicTheme migration session log\n Started: {}\n Process: {}\n{BANNER_RULE}\n",
            now.format("%Y-%m-%d %H:%M:%S"),
            std::process::id(),
        );
        io::append_text(&path, &banner)?;
        *current = Some(path.clone());
        drop(current);

        for (stale, err) in failures {
            self.warning(format!(
                "Could not remove old log file {}: {err}",
                stale.display()
            ));
        }

        Ok(path)
    }

    /// Write a footer and detach from the session file. Later entries go to
    /// the console only.
    pub fn close(&self) {
        let path = self.lock().take();
        if let Some(path) = path {
            let footer = format!(
                "{BANNER_RULE}\n Session closed: {}\n{BANNER_RULE}\n",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );
            if let Err(e) = io::append_text(&path, &footer) {
                tracing::warn!(error = %e, "failed to close session log");
            }
        }
    }

    /// Active session file, or `None` if never initialised or closed.
    pub fn current_log_file(&self) -> Option<PathBuf> {
        self.lock().clone()
    }

    /// ` (see log: <path>)`, or an empty string without an active session.
    pub fn log_hint(&self) -> String {
        match self.current_log_file() {
            Some(p) => format!(" (see log: {})", p.display()),
            None => String::new(),
        }
    }

    pub fn log(&self, level: Level, message: impl AsRef<str>) {
        self.emit(level, message.as_ref(), Sink::Both);
    }

    pub fn console_only(&self, level: Level, message: impl AsRef<str>) {
        self.emit(level, message.as_ref(), Sink::ConsoleOnly);
    }

    pub fn file_only(&self, level: Level, message: impl AsRef<str>) {
        self.emit(level, message.as_ref(), Sink::FileOnly);
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(Level::Info, message);
    }

    pub fn success(&self, message: impl AsRef<str>) {
        self.log(Level::Success, message);
    }

    pub fn warning(&self, message: impl AsRef<str>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(Level::Error, message);
    }

    fn emit(&self, level: Level, message: &str, sink: Sink) {
        if sink != Sink::FileOnly {
            let line = format!("{} {}", level.emoji(), level.paint(message));
            if level == Level::Error {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }

        if sink == Sink::ConsoleOnly {
            return;
        }
        let Some(path) = self.current_log_file() else {
            return;
        };
        let entry = format!(
            "[{}] [{}] {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            level.as_str(),
            message
        );
        if let Err(e) = io::append_text(&path, &entry) {
            tracing::warn!(error = %e, path = %path.display(), "failed to append to session log");
        }
    }

    /// Delete all but the `max_files - 1` most recently modified session
    /// files. Returns the deletions that failed.
    fn rotate(&self) -> Vec<(PathBuf, std::io::Error)> {
        let keep = self.max_files.saturating_sub(1);
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, dir = %self.dir.display(), "cannot list log directory");
                return Vec::new();
            }
        };

        let mut logs: Vec<(PathBuf, SystemTime)> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(paths::is_session_log_name)
            })
            .filter_map(|e| {
                let modified = e.metadata().ok()?.modified().ok();
                Some((e.path(), modified.unwrap_or(SystemTime::UNIX_EPOCH)))
            })
            .collect();

        logs.sort_by(|a, b| b.1.cmp(&a.1));

        let mut failures = Vec::new();
        for (path, _) in logs.into_iter().skip(keep) {
            tracing::debug!(path = %path.display(), "rotating out old session log");
            if let Err(e) = std::fs::remove_file(&path) {
                failures.push((path, e));
            }
        }
        failures
    }

    /// A session file name that does not exist yet. Names carry millisecond
    /// resolution; on a clash wait for the clock to move on.
    fn fresh_session_path(&self) -> PathBuf {
        loop {
            let path = self.dir.join(paths::session_log_name(&Local::now()));
            if !path.exists() {
                return path;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}
