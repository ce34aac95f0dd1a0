use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use guestctl::cli::{Cli, Command};
use guestctl::config;
use guestctl::error::GuestctlError;
use guestctl::flow::{self, Outcome};
use guestctl::prompt::TerminalConfirmer;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("guestctl=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("guestctl=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // No mode selected: print usage and leave, successfully.
    let Some(command) = cli.command else {
        Cli::command().print_help().map_err(|e| GuestctlError::Io {
            context: "printing usage".into(),
            source: e,
        })?;
        return Ok(());
    };

    let config = config::load_config(&cli.config)?;

    match command {
        Command::Install => {
            let mut confirmer = TerminalConfirmer;
            match flow::install(&config, &mut confirmer).await? {
                Outcome::Completed => {
                    println!("Installation finished. Run `guestctl <username>` to connect.");
                }
                Outcome::Cancelled => println!("Installation cancelled."),
            }
        }
        Command::Graphical => flow::graphical(&config).await?,
        Command::Connect(args) => {
            let user = parse_username(&args)?;

            // Ctrl-C stops the retry loop; the detached hypervisor keeps
            // running, which is the point of starting it detached.
            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                });
            }

            if flow::connect(&config, &user, &cancel).await?.is_none() {
                println!("\nStopped waiting for the VM. The guest may still be booting.");
            }
        }
    }

    Ok(())
}

/// The external-subcommand form carries the raw tail of the command
/// line; the first word is the username and nothing else is accepted.
fn parse_username(args: &[String]) -> Result<String, GuestctlError> {
    match args {
        [user] if !user.is_empty() => Ok(user.clone()),
        [_, extra, ..] => Err(GuestctlError::Validation {
            message: format!("unexpected argument after username: '{extra}'"),
        }),
        _ => Err(GuestctlError::Validation {
            message: "missing username".into(),
        }),
    }
}
