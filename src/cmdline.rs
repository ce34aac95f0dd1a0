//! Argument-vector assembly for the external tools.
//!
//! Everything the program knows about QEMU, `qemu-img` and `ssh` flag
//! syntax lives here, derived from the [`Config`]. The launcher gets a
//! plain `Vec<String>` and stays ignorant of what it is running.

use crate::config::Config;

/// `qemu-img create -f <format> <path> <size>`
pub fn create_disk_args(config: &Config) -> Vec<String> {
    vec![
        "create".into(),
        "-f".into(),
        config.disk.format.clone(),
        config.disk.path.clone(),
        config.disk.size.clone(),
    ]
}

/// The base QEMU invocation shared by every mode: memory, machine type,
/// the guest disk, acceleration, user-mode networking with the SSH port
/// forward, and the display adapter.
pub fn base_args(config: &Config) -> Vec<String> {
    vec![
        "-m".into(),
        config.hypervisor.memory.clone(),
        "-M".into(),
        config.hypervisor.machine.clone(),
        "-drive".into(),
        format!(
            "file={},format={}",
            config.disk.path, config.disk.format
        ),
        "-accel".into(),
        config.hypervisor.accel.clone(),
        "-net".into(),
        "nic".into(),
        "-net".into(),
        format!(
            "user,hostfwd=tcp::{}-:{}",
            config.network.host_port, config.network.guest_port
        ),
        "-device".into(),
        config.hypervisor.display_device.clone(),
    ]
}

/// Install mode: base flags plus the installer ISO on the CD-ROM drive.
pub fn install_args(config: &Config) -> Vec<String> {
    let mut args = base_args(config);
    args.push("-cdrom".into());
    args.push(config.installer.path.clone());
    args
}

/// Connect mode: base flags plus a VNC display so the guest keeps
/// running without a console attached.
pub fn headless_args(config: &Config) -> Vec<String> {
    let mut args = base_args(config);
    args.push("-vnc".into());
    args.push(config.hypervisor.vnc_display.clone());
    args
}

/// `ssh [-X] -p <port> <user>@<host>`
pub fn ssh_args(config: &Config, user: &str) -> Vec<String> {
    let mut args = vec!["-p".into(), config.network.host_port.to_string()];
    if config.ssh.forward_x11 {
        args.push("-X".into());
    }
    args.push(format!("{user}@{}", config.ssh.host));
    args
}
