//! Flat key=value settings for the migration tool.
//!
//! The settings file lives at `<tool root>/.env` and carries exactly three
//! keys. It is read with `dotenvy` (without touching the process
//! environment) and always rewritten in full on save.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CivicError, Result};
use crate::{io, paths};

pub const KEY_SUBTHEME_DIR: &str = "SUBTHEME_DIR";
pub const KEY_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const KEY_MODEL: &str = "ANTHROPIC_MODEL";

pub const DEFAULT_MODEL: &str = "claude-3-7-sonnet-latest";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Resolved tool configuration. Empty strings/paths mean "not set".
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub subtheme_dir: PathBuf,
    pub api_key: String,
    pub model: String,
    /// Whether the values came from an existing settings file.
    pub exists: bool,
}

impl Settings {
    pub fn new(
        subtheme_dir: impl Into<PathBuf>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Settings {
            subtheme_dir: subtheme_dir.into(),
            api_key: api_key.into(),
            model: model.into(),
            exists: false,
        }
    }

    fn not_configured() -> Self {
        Settings::new(PathBuf::new(), String::new(), DEFAULT_MODEL)
    }

    pub fn is_configured(&self) -> bool {
        self.exists
    }

    /// `sk-ant-…abcd` style rendering for display. Short keys are fully masked.
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.is_empty() {
            return "(not set)".to_string();
        }
        if chars.len() < 12 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..7].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }

    /// Environment overrides handed to every pipeline step.
    pub fn step_env(&self) -> Vec<(String, String)> {
        vec![
            (
                KEY_SUBTHEME_DIR.to_string(),
                self.subtheme_dir.to_string_lossy().into_owned(),
            ),
            (KEY_API_KEY.to_string(), self.api_key.clone()),
            (KEY_MODEL.to_string(), self.model.clone()),
        ]
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("subtheme_dir", &self.subtheme_dir)
            .field("api_key", &self.masked_api_key())
            .field("model", &self.model)
            .field("exists", &self.exists)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Outcome of an expected-failure check: never an `Err`, always a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub valid: bool,
    pub message: String,
}

impl Verdict {
    pub fn ok(message: impl Into<String>) -> Self {
        Verdict {
            valid: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Verdict {
            valid: false,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SettingsStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store rooted at the tool root: `<root>/.env`.
    pub fn new(root: &Path) -> Self {
        SettingsStore {
            path: paths::settings_path(root),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        SettingsStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the settings file. A missing file yields `exists == false` with
    /// defaults; a malformed one is `ConfigurationInvalid`.
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::not_configured());
        }

        let iter = dotenvy::from_path_iter(&self.path).map_err(|e| invalid(&self.path, e))?;

        let mut settings = Settings::not_configured();
        settings.exists = true;
        for item in iter {
            let (key, value) = item.map_err(|e| invalid(&self.path, e))?;
            match key.as_str() {
                KEY_SUBTHEME_DIR => settings.subtheme_dir = PathBuf::from(value),
                KEY_API_KEY => settings.api_key = value,
                KEY_MODEL if !value.trim().is_empty() => settings.model = value,
                _ => {}
            }
        }
        Ok(settings)
    }

    /// Overwrite the settings file with exactly the three known keys.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let subtheme = settings.subtheme_dir.to_string_lossy();
        let model = if settings.model.trim().is_empty() {
            DEFAULT_MODEL
        } else {
            settings.model.as_str()
        };
        let body = format!(
            "{KEY_SUBTHEME_DIR}={}\n{KEY_API_KEY}={}\n{KEY_MODEL}={}\n",
            quote(&subtheme),
            quote(&settings.api_key),
            quote(model),
        );
        io::atomic_write(&self.path, body.as_bytes())
    }

    /// Check that the tool is configured well enough to start a run.
    ///
    /// Checks directory *existence* only; eligibility is the subtheme
    /// validator's job.
    pub fn validate(&self) -> Result<Verdict> {
        if !self.path.exists() {
            return Ok(Verdict::fail(format!(
                "Migration tool is not configured: {} not found. Choose \"Configure\" first.",
                self.path.display()
            )));
        }

        let settings = match self.load() {
            Ok(s) => s,
            Err(CivicError::ConfigurationInvalid(msg)) => return Ok(Verdict::fail(msg)),
            Err(e) => return Err(e),
        };

        if settings.subtheme_dir.as_os_str().is_empty() {
            return Ok(Verdict::fail(format!(
                "Subtheme directory is not set ({KEY_SUBTHEME_DIR} missing from {}).",
                self.path.display()
            )));
        }

        if settings.api_key.is_empty() {
            return Ok(Verdict::fail(format!(
                "Anthropic API key is not set ({KEY_API_KEY} missing from {}).",
                self.path.display()
            )));
        }

        match std::fs::metadata(&settings.subtheme_dir) {
            Ok(meta) if meta.is_dir() => Ok(Verdict::ok(format!(
                "Configuration OK: subtheme at {}, model {}.",
                settings.subtheme_dir.display(),
                settings.model
            ))),
            Ok(_) => Ok(Verdict::fail(format!(
                "Subtheme directory is not accessible: {} is not a directory.",
                settings.subtheme_dir.display()
            ))),
            Err(e) => Ok(Verdict::fail(format!(
                "Subtheme directory is not accessible: {} ({e}).",
                settings.subtheme_dir.display()
            ))),
        }
    }
}

fn invalid(path: &Path, err: dotenvy::Error) -> CivicError {
    CivicError::ConfigurationInvalid(format!("cannot parse {}: {err}", path.display()))
}

/// Quote a value so `dotenvy` reads it back verbatim: single quotes are
/// literal, double quotes are used only when the value itself has a `'`.
fn quote(value: &str) -> String {
    if !value.contains('\'') && !value.contains('\n') {
        return format!("'{value}'");
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> SettingsStore {
        SettingsStore::new(dir.path())
    }

    #[test]
    fn missing_file_loads_as_not_configured() {
        let dir = TempDir::new().unwrap();
        let settings = store(&dir).load().unwrap();
        assert!(!settings.is_configured());
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let saved = Settings::new("/srv/themes/my theme", "sk-ant-abc123$HOME", "claude-x");
        store(&dir).save(&saved).unwrap();

        let loaded = store(&dir).load().unwrap();
        assert!(loaded.exists);
        assert_eq!(loaded.subtheme_dir, saved.subtheme_dir);
        assert_eq!(loaded.api_key, saved.api_key);
        assert_eq!(loaded.model, saved.model);
    }

    #[test]
    fn surrounding_whitespace_survives_a_round_trip() {
        let dir = TempDir::new().unwrap();
        let saved = Settings::new("/srv/theme ", " sk-key ", "claude-x");
        store(&dir).save(&saved).unwrap();

        let loaded = store(&dir).load().unwrap();
        assert_eq!(loaded.subtheme_dir, PathBuf::from("/srv/theme "));
        assert_eq!(loaded.api_key, " sk-key ");
        assert_eq!(loaded.model, "claude-x");
    }

    #[test]
    fn values_with_quotes_round_trip() {
        let dir = TempDir::new().unwrap();
        let saved = Settings::new("/srv/o'brien/\"theme\"", "k\\ey$1", DEFAULT_MODEL);
        store(&dir).save(&saved).unwrap();
        let loaded = store(&dir).load().unwrap();
        assert_eq!(loaded.subtheme_dir, saved.subtheme_dir);
        assert_eq!(loaded.api_key, saved.api_key);
    }

    #[test]
    fn save_overwrites_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "OTHER=keep-me\nSUBTHEME_DIR=/old\n").unwrap();
        store(&dir)
            .save(&Settings::new("/new", "key", "model"))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("OTHER"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn missing_model_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "SUBTHEME_DIR=/a\nANTHROPIC_API_KEY=k\n",
        )
        .unwrap();
        let settings = store(&dir).load().unwrap();
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn validate_reports_not_configured() {
        let dir = TempDir::new().unwrap();
        let verdict = store(&dir).validate().unwrap();
        assert!(!verdict.valid);
        assert!(verdict.message.contains("not configured"));
    }

    #[test]
    fn validate_reports_missing_directory_value() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".env"), "ANTHROPIC_API_KEY=k\n").unwrap();
        let verdict = store(&dir).validate().unwrap();
        assert!(!verdict.valid);
        assert!(verdict.message.contains("Subtheme directory is not set"));
    }

    #[test]
    fn validate_reports_missing_api_key() {
        let dir = TempDir::new().unwrap();
        let theme = dir.path().join("theme");
        std::fs::create_dir(&theme).unwrap();
        store(&dir)
            .save(&Settings::new(&theme, "", DEFAULT_MODEL))
            .unwrap();
        let verdict = store(&dir).validate().unwrap();
        assert!(!verdict.valid);
        assert!(verdict.message.contains("API key is not set"));
    }

    #[test]
    fn validate_reports_inaccessible_directory() {
        let dir = TempDir::new().unwrap();
        store(&dir)
            .save(&Settings::new(dir.path().join("nope"), "key", DEFAULT_MODEL))
            .unwrap();
        let verdict = store(&dir).validate().unwrap();
        assert!(!verdict.valid);
        assert!(verdict.message.contains("not accessible"));
    }

    #[test]
    fn validate_accepts_existing_directory() {
        let dir = TempDir::new().unwrap();
        store(&dir)
            .save(&Settings::new(dir.path(), "key", DEFAULT_MODEL))
            .unwrap();
        assert!(store(&dir).validate().unwrap().valid);
    }

    #[test]
    fn masked_key_hides_the_middle() {
        let s = Settings::new("/a", "sk-ant-api03-abcdefgh-wxyz", DEFAULT_MODEL);
        assert_eq!(s.masked_api_key(), "sk-ant-…wxyz");
        let short = Settings::new("/a", "short", DEFAULT_MODEL);
        assert_eq!(short.masked_api_key(), "*****");
        let empty = Settings::new("/a", "", DEFAULT_MODEL);
        assert_eq!(empty.masked_api_key(), "(not set)");
    }
}
