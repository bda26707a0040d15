//! Eligibility checks for a CivicTheme subtheme directory.
//!
//! A directory is a migratable subtheme when it has a `<basename>.info.yml`
//! descriptor that declares a theme based on `civictheme`, and a
//! `components/` directory. Inspection is read-only.

use std::path::{Path, PathBuf};

use crate::error::{CivicError, Result};
use crate::paths;

// ---------------------------------------------------------------------------
// DescriptorCheck
// ---------------------------------------------------------------------------

/// Decides whether descriptor text declares a CivicTheme subtheme.
pub trait DescriptorCheck {
    fn is_civictheme_subtheme(&self, descriptor: &str) -> bool;
}

/// Literal substring test on the raw descriptor text.
///
/// Matches in comments or unrelated keys count too; this is a known
/// looseness, kept until stricter matching is actually wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringCheck;

pub const REQUIRED_SUBSTRINGS: [&str; 3] = ["name:", "type: theme", "base theme: civictheme"];

impl DescriptorCheck for SubstringCheck {
    fn is_civictheme_subtheme(&self, descriptor: &str) -> bool {
        REQUIRED_SUBSTRINGS.iter().all(|s| descriptor.contains(s))
    }
}

// ---------------------------------------------------------------------------
// SubthemeReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubthemeReport {
    pub descriptor_path: Option<PathBuf>,
    pub descriptor_exists: bool,
    pub descriptor_valid: bool,
    pub components_exists: bool,
    /// One ✅/❌ line per check that ran.
    pub message: String,
}

impl SubthemeReport {
    pub fn is_valid(&self) -> bool {
        self.descriptor_exists && self.descriptor_valid && self.components_exists
    }

    /// `Ok(())` when valid, `ValidationFailed` with the itemized message otherwise.
    pub fn into_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(CivicError::ValidationFailed(self.message))
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate `dir` with the default [`SubstringCheck`].
pub fn validate(dir: &Path) -> Result<SubthemeReport> {
    validate_with(dir, &SubstringCheck)
}

/// Validate `dir`, delegating the descriptor content test to `check`.
///
/// Only unexpected I/O failures (anything but "not found") are `Err`; every
/// eligibility problem is reported through the returned [`SubthemeReport`].
pub fn validate_with(dir: &Path, check: &dyn DescriptorCheck) -> Result<SubthemeReport> {
    let descriptor = paths::descriptor_path(dir);
    let descriptor_name = descriptor
        .as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("<basename>{}", paths::DESCRIPTOR_SUFFIX));

    let descriptor_exists = descriptor.as_deref().is_some_and(Path::is_file);
    if !descriptor_exists {
        return Ok(SubthemeReport {
            descriptor_path: descriptor,
            descriptor_exists: false,
            descriptor_valid: false,
            components_exists: false,
            message: format!("❌ Missing theme descriptor: {descriptor_name}"),
        });
    }

    let mut lines = vec![format!("✅ Theme descriptor found: {descriptor_name}")];

    let text = match descriptor.as_deref() {
        Some(p) => std::fs::read_to_string(p)?,
        None => String::new(),
    };
    let descriptor_valid = check.is_civictheme_subtheme(&text);
    lines.push(if descriptor_valid {
        "✅ Descriptor declares a theme based on civictheme".to_string()
    } else {
        format!(
            "❌ Descriptor must contain {}",
            REQUIRED_SUBSTRINGS
                .iter()
                .map(|s| format!("'{s}'"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    });

    let components_exists = paths::components_dir(dir).is_dir();
    lines.push(if components_exists {
        format!("✅ {}/ directory found", paths::COMPONENTS_DIR)
    } else {
        format!("❌ Missing {}/ directory", paths::COMPONENTS_DIR)
    });

    Ok(SubthemeReport {
        descriptor_path: descriptor,
        descriptor_exists,
        descriptor_valid,
        components_exists,
        message: lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GOOD_DESCRIPTOR: &str =
        "name: My Theme\ntype: theme\nbase theme: civictheme\ncore_version_requirement: ^10\n";

    fn theme_dir(root: &TempDir) -> PathBuf {
        let dir = root.path().join("mytheme");
        std::fs::create_dir(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_descriptor_is_a_hard_stop() {
        let root = TempDir::new().unwrap();
        let dir = theme_dir(&root);
        std::fs::create_dir(dir.join("components")).unwrap();

        let report = validate(&dir).unwrap();
        assert!(!report.is_valid());
        assert!(!report.descriptor_exists);
        // Later checks never ran.
        assert!(!report.components_exists);
        assert!(report
            .message
            .to_lowercase()
            .contains("missing theme descriptor"));
        assert_eq!(report.message.lines().count(), 1);
    }

    #[test]
    fn missing_components_dir_is_reported() {
        let root = TempDir::new().unwrap();
        let dir = theme_dir(&root);
        std::fs::write(dir.join("mytheme.info.yml"), GOOD_DESCRIPTOR).unwrap();

        let report = validate(&dir).unwrap();
        assert!(!report.is_valid());
        assert!(report.descriptor_valid);
        assert!(!report.components_exists);
        assert!(report.message.contains("❌ Missing components/ directory"));
    }

    #[test]
    fn descriptor_without_base_theme_is_rejected() {
        let root = TempDir::new().unwrap();
        let dir = theme_dir(&root);
        std::fs::write(dir.join("mytheme.info.yml"), "name: X\ntype: theme\n").unwrap();
        std::fs::create_dir(dir.join("components")).unwrap();

        let report = validate(&dir).unwrap();
        assert!(!report.is_valid());
        assert!(!report.descriptor_valid);
        assert!(report.components_exists);
        assert!(report.message.contains("'base theme: civictheme'"));
    }

    #[test]
    fn conforming_fixture_is_valid() {
        let root = TempDir::new().unwrap();
        let dir = theme_dir(&root);
        std::fs::write(dir.join("mytheme.info.yml"), GOOD_DESCRIPTOR).unwrap();
        std::fs::create_dir(dir.join("components")).unwrap();

        let report = validate(&dir).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.message.matches('✅').count(), 3);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn substring_match_in_comment_still_passes() {
        // Known looseness of the textual check.
        let text = "# name: type: theme base theme: civictheme\n";
        assert!(SubstringCheck.is_civictheme_subtheme(text));
    }

    #[test]
    fn custom_check_replaces_the_heuristic() {
        struct Never;
        impl DescriptorCheck for Never {
            fn is_civictheme_subtheme(&self, _: &str) -> bool {
                false
            }
        }

        let root = TempDir::new().unwrap();
        let dir = theme_dir(&root);
        std::fs::write(dir.join("mytheme.info.yml"), GOOD_DESCRIPTOR).unwrap();
        std::fs::create_dir(dir.join("components")).unwrap();

        let report = validate_with(&dir, &Never).unwrap();
        assert!(!report.descriptor_valid);
        assert!(matches!(
            report.into_result(),
            Err(CivicError::ValidationFailed(_))
        ));
    }

    #[test]
    fn validation_does_not_touch_the_directory() {
        let root = TempDir::new().unwrap();
        let dir = theme_dir(&root);
        std::fs::write(dir.join("mytheme.info.yml"), GOOD_DESCRIPTOR).unwrap();
        let before: Vec<_> = std::fs::read_dir(&dir).unwrap().map(|e| e.unwrap().path()).collect();
        validate(&dir).unwrap();
        let after: Vec<_> = std::fs::read_dir(&dir).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(before, after);
    }
}
