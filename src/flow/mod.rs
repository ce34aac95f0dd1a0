//! The three modes of operation, sequenced over the fetcher and the
//! process launcher. Each invocation runs exactly one mode and carries
//! no state across runs.

pub mod connect;
pub mod install;

use crate::cmdline;
use crate::config::Config;
use crate::error::GuestctlError;
use crate::process;

pub use connect::connect;
pub use install::install;

/// How a mode ended, for the cases that are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The user declined a confirmation prompt. Clean exit, not an error.
    Cancelled,
}

/// `graphical` mode: run the hypervisor with the base flags and hand it
/// the terminal until the user shuts the guest down.
pub async fn graphical(config: &Config) -> Result<(), GuestctlError> {
    let status =
        process::run_blocking(&config.hypervisor.program, &cmdline::base_args(config)).await?;
    if !status.success() {
        tracing::warn!(%status, "hypervisor exited abnormally");
    }
    Ok(())
}
