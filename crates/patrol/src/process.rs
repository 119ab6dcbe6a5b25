//! External process execution with hard timeouts

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ExecError;

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when killed by a signal
    pub code: Option<i32>,
    /// stdout followed by stderr
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Run a program directly (no shell) and wait for it.
///
/// The child leads its own process group. If `limit` elapses the whole
/// group is killed, so grandchildren (`sh -c` pipelines, the node process
/// behind `npx`) die with it; that is reported as [`ExecError::Timeout`].
pub async fn run(
    program: &str,
    args: &[String],
    cwd: &Path,
    limit: Duration,
) -> Result<ProcessOutput, ExecError> {
    debug!(program, ?args, cwd = %cwd.display(), "spawning");

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let child = command.spawn().map_err(|source| ExecError::Spawn {
        program: program.to_string(),
        source,
    })?;
    let pid = child.id();

    match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            Ok(ProcessOutput {
                code: output.status.code(),
                output: format!("{}{}", stdout, stderr),
            })
        }
        Ok(Err(source)) => Err(ExecError::Wait {
            program: program.to_string(),
            source,
        }),
        Err(_) => {
            kill_process_group(pid);
            Err(ExecError::Timeout {
                program: program.to_string(),
                limit,
            })
        }
    }
}

/// SIGKILL every process in the group led by `pid`
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else { return };
    let Ok(pgid) = libc::pid_t::try_from(pid) else { return };

    // A negative pid addresses the process group
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Run a fixed command line through `sh -c`
pub async fn run_shell(
    command: &str,
    cwd: &Path,
    limit: Duration,
) -> Result<ProcessOutput, ExecError> {
    run("sh", &["-c".to_string(), command.to_string()], cwd, limit).await
}

/// Directory a file's tools run in
pub fn working_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_captures_stdout_then_stderr() {
        let out = run_shell("echo out; echo err >&2; exit 3", Path::new("."), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert!(!out.success());
        assert_eq!(out.output, "out\nerr\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_within_bound() {
        let start = Instant::now();
        let result = run_shell("sleep 30", Path::new("."), Duration::from_millis(300)).await;
        assert!(matches!(result, Err(ExecError::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("late");
        let script = format!("sh -c 'sleep 1; touch {}'; :", marker.display());

        let result = run_shell(&script, dir.path(), Duration::from_millis(300)).await;
        assert!(matches!(result, Err(ExecError::Timeout { .. })));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_timeout_message_keeps_subsecond_limit() {
        let err = run_shell("sleep 5", Path::new("."), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "sh timed out after 200ms");
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let result = run(
            "patrol-definitely-not-installed",
            &[],
            Path::new("."),
            Duration::from_secs(5),
        )
        .await;
        assert!(matches!(result, Err(ExecError::Spawn { .. })));
    }

    #[test]
    fn test_working_dir() {
        assert_eq!(working_dir(Path::new("/p/src/a.js")), Path::new("/p/src"));
        assert_eq!(working_dir(Path::new("a.js")), Path::new("."));
    }
}
