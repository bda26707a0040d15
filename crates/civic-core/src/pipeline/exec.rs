//! Subprocess invocation for script-backed pipeline steps.
//!
//! Shell steps always run under `bash`. JavaScript steps run under the best
//! available runtime, detected once per call in priority order:
//! 1. bun
//! 2. deno
//! 3. node

use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::{CivicError, Result};

/// Ceiling on captured bytes per stream. Anything past it is drained and
/// dropped so a chatty step cannot block on a full pipe.
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// The available JavaScript runtimes, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Bun,
    Deno,
    Node,
}

impl Runtime {
    pub fn name(&self) -> &'static str {
        match self {
            Runtime::Bun => "bun",
            Runtime::Deno => "deno",
            Runtime::Node => "node",
        }
    }
}

/// Detect the best available JavaScript runtime.
/// Returns None if no supported runtime is found.
pub fn detect_runtime() -> Option<Runtime> {
    if which::which("bun").is_ok() {
        return Some(Runtime::Bun);
    }
    if which::which("deno").is_ok() {
        return Some(Runtime::Deno);
    }
    if which::which("node").is_ok() {
        return Some(Runtime::Node);
    }
    None
}

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    /// At least one stream exceeded [`MAX_OUTPUT_BYTES`].
    pub truncated: bool,
}

pub(crate) fn shell_command(script: &Path) -> Command {
    let mut cmd = Command::new("bash");
    cmd.arg(script);
    cmd
}

pub(crate) fn interpreted_command(runtime: Runtime, script: &Path) -> Command {
    match runtime {
        Runtime::Bun => {
            let mut cmd = Command::new("bun");
            cmd.arg("run").arg(script);
            cmd
        }
        Runtime::Deno => {
            let mut cmd = Command::new("deno");
            cmd.args([
                "run",
                "--allow-read",
                "--allow-write",
                "--allow-env",
                "--allow-run",
                "--allow-net",
            ])
            .arg(script);
            cmd
        }
        Runtime::Node => {
            let mut cmd = Command::new("node");
            cmd.arg(script);
            cmd
        }
    }
}

/// Run `cmd` in `cwd` with `env` layered over the inherited environment and
/// capture both streams concurrently.
pub(crate) async fn run_captured(
    mut cmd: Command,
    cwd: &Path,
    env: &[(String, String)],
) -> Result<ProcessOutput> {
    cmd.current_dir(cwd)
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn()?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| CivicError::Io(std::io::Error::other("stdout not captured")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| CivicError::Io(std::io::Error::other("stderr not captured")))?;

    let (out, err) = tokio::try_join!(
        read_capped(stdout, MAX_OUTPUT_BYTES),
        read_capped(stderr, MAX_OUTPUT_BYTES)
    )?;
    let status = child.wait().await?;

    Ok(ProcessOutput {
        status,
        stdout: String::from_utf8_lossy(&out.0).into_owned(),
        stderr: String::from_utf8_lossy(&err.0).into_owned(),
        truncated: out.1 || err.1,
    })
}

/// Read `reader` to EOF, keeping at most `limit` bytes.
async fn read_capped<R>(mut reader: R, limit: usize) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut truncated = false;
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(kept.len());
        if n > room {
            truncated = true;
        }
        kept.extend_from_slice(&chunk[..n.min(room)]);
    }
    Ok((kept, truncated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detect_runtime_returns_some_or_none() {
        // Only checks it does not panic; the result depends on the host.
        let _ = detect_runtime();
    }

    fn argv(cmd: &Command) -> Vec<String> {
        let inner = cmd.as_std();
        std::iter::once(inner.get_program())
            .chain(inner.get_args())
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn each_runtime_gets_its_own_invocation() {
        let script = Path::new("/tool/scripts/convert.mjs");
        assert_eq!(
            argv(&interpreted_command(Runtime::Bun, script)),
            vec!["bun", "run", "/tool/scripts/convert.mjs"]
        );
        assert_eq!(
            argv(&interpreted_command(Runtime::Node, script)),
            vec!["node", "/tool/scripts/convert.mjs"]
        );
        let deno = argv(&interpreted_command(Runtime::Deno, script));
        assert_eq!(deno.first().map(String::as_str), Some("deno"));
        assert_eq!(deno.get(1).map(String::as_str), Some("run"));
        assert!(deno.contains(&"--allow-read".to_string()));
        assert!(deno.contains(&"--allow-env".to_string()));
        assert_eq!(deno.last().map(String::as_str), Some("/tool/scripts/convert.mjs"));
    }

    #[test]
    fn shell_steps_run_under_bash() {
        assert_eq!(
            argv(&shell_command(Path::new("/tool/scripts/update.sh"))),
            vec!["bash", "/tool/scripts/update.sh"]
        );
    }

    #[test]
    fn runtime_names_are_stable() {
        assert_eq!(Runtime::Bun.name(), "bun");
        assert_eq!(Runtime::Deno.name(), "deno");
        assert_eq!(Runtime::Node.name(), "node");
    }

    #[tokio::test]
    async fn read_capped_truncates_but_drains() {
        let data = vec![b'x'; 20_000];
        let (kept, truncated) = read_capped(&data[..], 100).await.unwrap();
        assert_eq!(kept.len(), 100);
        assert!(truncated);

        let (kept, truncated) = read_capped(&data[..], 50_000).await.unwrap();
        assert_eq!(kept.len(), 20_000);
        assert!(!truncated);
    }

    #[tokio::test]
    async fn shell_script_sees_env_and_cwd() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("probe.sh");
        std::fs::write(&script, "echo \"dir=$SUBTHEME_DIR\"\npwd\necho oops >&2\nexit 3\n").unwrap();

        let out = run_captured(
            shell_command(&script),
            dir.path(),
            &[("SUBTHEME_DIR".into(), "/themes/x".into())],
        )
        .await
        .unwrap();

        assert_eq!(out.status.code(), Some(3));
        assert!(out.stdout.contains("dir=/themes/x"));
        let cwd = dir.path().canonicalize().unwrap();
        assert!(out.stdout.contains(&cwd.display().to_string()));
        assert_eq!(out.stderr.trim(), "oops");
        assert!(!out.truncated);
    }
}
