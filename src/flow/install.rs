//! Install mode: create the disk, fetch the installer, boot from it.

use std::path::Path;

use crate::cmdline;
use crate::config::Config;
use crate::error::GuestctlError;
use crate::fetch;
use crate::flow::Outcome;
use crate::process;
use crate::prompt::Confirmer;

/// Run the install sequence.
///
/// An existing disk image is never overwritten without the user saying
/// so; that disk is the whole installed system. After the guard:
/// blocking disk creation, installer fetch (skipped when already
/// present), then a blocking QEMU run booted from the ISO; the user
/// drives the installer and shuts the guest down when done.
pub async fn install(
    config: &Config,
    confirmer: &mut dyn Confirmer,
) -> Result<Outcome, GuestctlError> {
    let disk = Path::new(&config.disk.path);
    if disk.exists() {
        let overwrite = confirmer.confirm(&format!(
            "{} already exists. Reinstall and overwrite it?",
            config.disk.path
        ))?;
        if !overwrite {
            return Ok(Outcome::Cancelled);
        }
    }

    println!("Creating disk image...");
    let status =
        process::run_blocking(&config.disk.program, &cmdline::create_disk_args(config)).await?;
    if !status.success() {
        tracing::warn!(%status, "disk image creation exited abnormally");
    }

    fetch::ensure_installer(&config.installer.url, Path::new(&config.installer.path)).await?;

    println!("Booting the installer...");
    let status =
        process::run_blocking(&config.hypervisor.program, &cmdline::install_args(config)).await?;
    if !status.success() {
        tracing::warn!(%status, "hypervisor exited abnormally");
    }

    Ok(Outcome::Completed)
}
