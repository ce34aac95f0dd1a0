//! Connect mode: headless hypervisor plus the reachability retry loop.

use std::process::ExitStatus;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cmdline;
use crate::config::Config;
use crate::error::GuestctlError;
use crate::process;

/// Start the hypervisor detached and headless, then poll an SSH
/// connection to `user@<host>` until it lands.
///
/// The guest and the loop never talk directly; the only signal is the
/// SSH exit code. Returns the final SSH exit status, or `None` when the
/// token was cancelled while waiting between attempts.
pub async fn connect(
    config: &Config,
    user: &str,
    cancel: &CancellationToken,
) -> Result<Option<ExitStatus>, GuestctlError> {
    let child = process::spawn_detached(&config.hypervisor.program, &cmdline::headless_args(config))?;
    tracing::info!(pid = child.id(), "hypervisor started headless");

    println!("Trying to connect to the VM...");
    wait_for_shell(config, user, cancel).await
}

/// The reachability retry loop.
///
/// One attempt: spawn the SSH client blocking, inspect its exit code.
/// The configured transient code (255 by convention) means the transport
/// refused: sleep the configured delay and try again, indefinitely.
/// Any other exit ends the loop: the transport was reachable, whatever
/// happened on the far side. A client killed by a signal has no exit
/// code and counts as terminal too.
pub async fn wait_for_shell(
    config: &Config,
    user: &str,
    cancel: &CancellationToken,
) -> Result<Option<ExitStatus>, GuestctlError> {
    let args = cmdline::ssh_args(config, user);
    let delay = Duration::from_millis(config.ssh.retry_delay_ms);

    loop {
        let status = process::run_blocking(&config.ssh.program, &args).await?;

        if status.code() != Some(config.ssh.transient_exit_code) {
            tracing::debug!(%status, "shell exited, connection loop done");
            return Ok(Some(status));
        }

        tracing::debug!(
            code = config.ssh.transient_exit_code,
            "guest not reachable yet, retrying"
        );
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => return Ok(None),
        }
    }
}

#[cfg(unix)]
#[cfg(test)]
mod tests {
    use super::*;

    use std::path::{Path, PathBuf};
    use std::time::Instant;

    /// Stub shell client: counts invocations in a file, exits 255 until
    /// the count reaches `successes_after`, then exits 0.
    fn write_counting_stub(dir: &Path, successes_after: u32) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;
        let counter = dir.join("attempts");
        std::fs::write(&counter, "0").unwrap();
        let stub = dir.join("ssh");
        std::fs::write(
            &stub,
            format!(
                "#!/bin/sh\n\
                 n=$(cat {counter})\n\
                 n=$((n + 1))\n\
                 echo $n > {counter}\n\
                 [ $n -gt {successes_after} ] && exit 0\n\
                 exit 255\n",
                counter = counter.display(),
            ),
        )
        .unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();
        (stub, counter)
    }

    fn test_config(stub: &Path, delay_ms: u64) -> Config {
        let mut config = Config::default();
        config.ssh.program = stub.to_str().unwrap().to_string();
        config.ssh.retry_delay_ms = delay_ms;
        config
    }

    fn attempts(counter: &Path) -> u32 {
        std::fs::read_to_string(counter).unwrap().trim().parse().unwrap()
    }

    #[tokio::test]
    async fn retries_transient_exits_then_returns_the_first_real_one() {
        let dir = tempfile::tempdir().unwrap();
        let (stub, counter) = write_counting_stub(dir.path(), 3);
        let config = test_config(&stub, 20);

        let started = Instant::now();
        let status = wait_for_shell(&config, "alice", &CancellationToken::new())
            .await
            .unwrap()
            .expect("loop must end with a status");

        assert_eq!(status.code(), Some(0));
        assert_eq!(attempts(&counter), 4);
        // three retries, so at least three delays elapsed
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn nonzero_terminal_exit_ends_the_loop_too() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        // Auth failure style: reachable transport, unhappy far side.
        let stub = dir.path().join("ssh");
        std::fs::write(&stub, "#!/bin/sh\nexit 1\n").unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();
        let config = test_config(&stub, 10);

        let status = wait_for_shell(&config, "alice", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status.code(), Some(1));
    }

    #[tokio::test]
    async fn persistent_refusal_keeps_polling_until_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        // Never succeeds: the count threshold is unreachably high.
        let (stub, counter) = write_counting_stub(dir.path(), u32::MAX);
        let config = test_config(&stub, 10);

        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move { wait_for_shell(&config, "alice", &cancel).await })
        };

        // Bounded observation window instead of waiting forever.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!handle.is_finished(), "loop must still be retrying");
        assert!(attempts(&counter) >= 2);

        cancel.cancel();
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result, None, "cancellation ends the loop without a status");
    }

    #[tokio::test]
    async fn missing_client_is_fatal_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir.path().join("no-such-ssh"), 10);

        let err = wait_for_shell(&config, "alice", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GuestctlError::SpawnFailed { .. }));
    }
}
