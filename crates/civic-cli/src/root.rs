use std::path::{Path, PathBuf};

use civic_core::{paths, steps};

/// Environment variable naming the tool root explicitly.
pub const ENV_ROOT: &str = "CIVIC_MIGRATE_ROOT";

/// Resolve the tool root: where `.env`, `logs/` and `scripts/` live.
///
/// Priority:
/// 1. `CIVIC_MIGRATE_ROOT` (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `scripts/update-storybook.sh`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut dir = cwd.clone();
    loop {
        if paths::scripts_dir(&dir)
            .join(steps::UPDATE_STORYBOOK_SCRIPT)
            .is_file()
        {
            return dir;
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }

    cwd
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }
}
