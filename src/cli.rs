use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "guestctl",
    about = "Install, boot, and connect to a local Debian guest VM",
    after_help = "Any other first argument is treated as a guest username: \
                  the VM is started headless and an SSH session is retried \
                  until the guest is reachable."
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "guestctl.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the disk image, download the installer, and boot from it
    Install,

    /// Boot the installed guest with a graphical console
    Graphical,

    /// Any other argument: connect to the guest as that user
    #[command(external_subcommand)]
    Connect(Vec<String>),
}
