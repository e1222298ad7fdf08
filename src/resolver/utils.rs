// Helper functions shared by providers, the sampler and the recognizer

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::errors::ProcessError;

/// Run command with timeout.
///
/// The child is killed on timeout and when the returned future is dropped.
pub async fn run_output_with_timeout(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<std::process::Output, ProcessError> {
    debug!(program, args = %args.join(" "), "Spawning");

    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| ProcessError::Capture(program.to_string()))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| ProcessError::Capture(program.to_string()))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stdout_pipe.read_to_end(&mut buf).await;
        buf
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf).await;
        buf
    });

    let waited = timeout(Duration::from_secs(timeout_secs), child.wait()).await;
    match waited {
        Ok(status_res) => {
            let status = status_res.map_err(|source| ProcessError::Wait {
                program: program.to_string(),
                source,
            })?;
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            Ok(std::process::Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(ProcessError::Timeout {
                program: program.to_string(),
                secs: timeout_secs,
            })
        }
    }
}

/// Locate a binary: explicit path, common install locations, `which`, bare name
pub fn find_binary(name: &str, explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        if !path.trim().is_empty() {
            return path.to_string();
        }
    }

    let mut candidates: Vec<PathBuf> = vec![
        PathBuf::from("/opt/homebrew/bin").join(name), // Homebrew on Apple Silicon
        PathBuf::from("/usr/local/bin").join(name),    // Homebrew on Intel Mac
        PathBuf::from("/usr/bin").join(name),          // System installation
    ];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local/bin").join(name)); // pip --user
    }

    for path in candidates {
        if path.exists() {
            return path.to_string_lossy().to_string();
        }
    }

    if let Ok(output) = std::process::Command::new("which").arg(name).output() {
        if output.status.success() {
            let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !found.is_empty() {
                return found;
            }
        }
    }

    name.to_string()
}

/// Upper bound for a `--version` probe
pub const PROBE_TIMEOUT_SECS: u64 = 10;

/// Check that `program --version` exits successfully within `timeout_secs`
pub async fn binary_responds(program: &str, timeout_secs: u64) -> bool {
    match run_output_with_timeout(program, &["--version".to_string()], timeout_secs).await {
        Ok(output) => output.status.success(),
        Err(e) => {
            debug!(program, error = %e, "Version probe failed");
            false
        }
    }
}

/// Whether the media location is fetched over the network
pub fn is_remote(location: &str) -> bool {
    let lower = location.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Best-effort removal of a file, ignoring "not found"
pub fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to delete temporary file");
        }
    }
}
