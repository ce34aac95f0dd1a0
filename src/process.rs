//! External process launching.
//!
//! Two patterns, matching how the modes use their tools: run a child to
//! completion with the terminal handed over, or start one detached and
//! leave it running. A spawn failure is fatal to the calling mode; there
//! is no retry at this layer.

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};

use crate::error::GuestctlError;

/// Run `program` with `args`, inheriting stdio, and wait for it to exit.
///
/// The child owns the terminal for its lifetime: QEMU draws its console
/// there and ssh runs its interactive session there.
pub async fn run_blocking(program: &str, args: &[String]) -> Result<ExitStatus, GuestctlError> {
    tracing::debug!(program, ?args, "running to completion");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| GuestctlError::SpawnFailed {
            program: program.to_string(),
            source: e,
        })?;

    child.wait().await.map_err(|e| GuestctlError::Io {
        context: format!("waiting for {program}"),
        source: e,
    })
}

/// Start `program` detached: no stdio, child not awaited and not killed
/// when the handle drops. The caller gets the handle back only so it can
/// log the pid. Once launched, the process is on its own.
pub fn spawn_detached(program: &str, args: &[String]) -> Result<Child, GuestctlError> {
    tracing::debug!(program, ?args, "spawning detached");

    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| GuestctlError::SpawnFailed {
            program: program.to_string(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_executable_is_spawn_failed() {
        let err = run_blocking("/nonexistent/hypervisor", &[]).await.unwrap_err();
        match err {
            GuestctlError::SpawnFailed { program, .. } => {
                assert_eq!(program, "/nonexistent/hypervisor");
            }
            other => panic!("expected SpawnFailed, got {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn blocking_run_reports_the_exit_code() {
        let status = run_blocking("sh", &["-c".into(), "exit 7".into()])
            .await
            .unwrap();
        assert_eq!(status.code(), Some(7));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn detached_child_outlives_the_handle() {
        let child = spawn_detached("sh", &["-c".into(), "sleep 0.2".into()]).unwrap();
        let pid = child.id().unwrap();
        drop(child);
        // The child must still be alive after its handle is gone.
        assert!(std::path::Path::new(&format!("/proc/{pid}")).exists());
    }
}
