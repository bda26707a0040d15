use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Tool-root layout
// ---------------------------------------------------------------------------

pub const SETTINGS_FILE: &str = ".env";
pub const LOGS_DIR: &str = "logs";
pub const SCRIPTS_DIR: &str = "scripts";

pub const SESSION_LOG_PREFIX: &str = "migration-";
pub const SESSION_LOG_EXT: &str = ".log";

// ---------------------------------------------------------------------------
// Subtheme layout
// ---------------------------------------------------------------------------

pub const COMPONENTS_DIR: &str = "components";
pub const DESCRIPTOR_SUFFIX: &str = ".info.yml";
pub const TEMPLATE_EXT: &str = "twig";
pub const SCHEMA_SUFFIX: &str = ".component.yml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn logs_dir(root: &Path) -> PathBuf {
    root.join(LOGS_DIR)
}

pub fn scripts_dir(root: &Path) -> PathBuf {
    root.join(SCRIPTS_DIR)
}

pub fn components_dir(subtheme: &Path) -> PathBuf {
    subtheme.join(COMPONENTS_DIR)
}

/// `<dir>/<basename>.info.yml`. `None` when the path has no usable basename
/// (e.g. `/` or `..`).
pub fn descriptor_path(subtheme: &Path) -> Option<PathBuf> {
    let name = subtheme.file_name()?.to_str()?;
    Some(subtheme.join(format!("{name}{DESCRIPTOR_SUFFIX}")))
}

/// Sibling schema path for a Twig template: `button.twig` → `button.component.yml`.
pub fn schema_path_for(template: &Path) -> Option<PathBuf> {
    let stem = template.file_stem()?.to_str()?;
    Some(template.with_file_name(format!("{stem}{SCHEMA_SUFFIX}")))
}

/// Session log file name for the given timestamp, e.g.
/// `migration-20261015-093012-041.log`.
pub fn session_log_name(stamp: &chrono::DateTime<chrono::Local>) -> String {
    format!(
        "{SESSION_LOG_PREFIX}{}{SESSION_LOG_EXT}",
        stamp.format("%Y%m%d-%H%M%S-%3f")
    )
}

/// Whether a file name follows the session-log naming pattern.
pub fn is_session_log_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^migration-\d{8}-\d{6}-\d{3}\.log$").expect("valid session log regex")
    });
    re.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn descriptor_uses_directory_basename() {
        let p = descriptor_path(Path::new("/themes/mytheme")).unwrap();
        assert_eq!(p, Path::new("/themes/mytheme/mytheme.info.yml"));
    }

    #[test]
    fn schema_path_replaces_twig_extension() {
        let p = schema_path_for(Path::new("components/atoms/button/button.twig")).unwrap();
        assert_eq!(p, Path::new("components/atoms/button/button.component.yml"));
    }

    #[test]
    fn session_log_name_round_trips_through_pattern() {
        let stamp = chrono::Local
            .with_ymd_and_hms(2026, 10, 15, 9, 30, 12)
            .unwrap();
        let name = session_log_name(&stamp);
        assert_eq!(name, "migration-20261015-093012-000.log");
        assert!(is_session_log_name(&name));
    }

    #[test]
    fn unrelated_files_are_not_session_logs() {
        assert!(!is_session_log_name("migration.log"));
        assert!(!is_session_log_name("migration-20261015-093012-000.log.bak"));
        assert!(!is_session_log_name("notes.txt"));
    }
}
