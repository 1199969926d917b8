//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate
//! command handlers.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

use crate::commands;
use crate::logging;

/// A terminal camera recorder: countdown capture, review, library upload
#[derive(Parser)]
#[command(name = "camcord")]
#[command(version)]
#[command(about = "\n\n ▸ camcord \n")]
#[command(
    long_about = "\n\n ▸ camcord \n\nA terminal-based camera+microphone recorder. Start a take with a timed\ncountdown, review it, give it a title, and upload it to your recording\nlibrary.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n\nEXAMPLES:\n    # Record a take and upload it\n    $ camcord\n    $ camcord record\n    \n    # Configure the library service and bearer token\n    $ camcord auth\n    \n    # Browse what you have stored\n    $ camcord library list\n    $ camcord library rename 3 \"Sprint demo\"\n    $ camcord library delete 3\n    \n    # See what you uploaded recently\n    $ camcord history"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/camcord/camcord.toml\n    Logs:               ~/.local/state/camcord/camcord.log.*\n\nDuring a recording, SIGUSR1 stops the take (handy for scripted captures)."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a take with countdown, review and upload (default)
    ///
    /// Press Enter to start, Enter again to stop. In review, type a title,
    /// then Enter to upload or Escape to discard.
    #[command(visible_alias = "r")]
    Record,

    /// Browse and manage your recording library
    ///
    /// Thin wrappers around the remote library service. Requires a bearer
    /// token configured via 'camcord auth'.
    #[command(visible_alias = "l")]
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },

    /// Configure the library service URL and bearer token
    ///
    /// The token is stored with restricted permissions in
    /// ~/.local/share/camcord and attached to uploads and library calls.
    #[command(visible_alias = "a")]
    Auth {
        /// Remove the stored token instead of updating it
        #[arg(long)]
        clear: bool,
    },

    /// Show recently uploaded recordings
    ///
    /// Lists the local record of successful uploads: title, duration,
    /// size and the id assigned by the library service.
    #[command(visible_alias = "h")]
    History,

    /// List available capture devices
    ///
    /// Shows device IDs and names to help configure the correct
    /// video/audio inputs in camcord.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Open configuration file in your preferred editor
    ///
    /// Edit capture devices, resolution, countdown and server settings.
    /// Uses $EDITOR environment variable or falls back to nano/vim.
    #[command(visible_alias = "c")]
    Config,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   camcord completions bash > camcord.bash
    ///   camcord completions zsh > _camcord
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum LibraryAction {
    /// List stored recordings
    List,
    /// Rename a stored recording
    Rename {
        /// Recording id from 'camcord library list'
        id: i64,
        /// New title
        title: String,
    },
    /// Delete a stored recording
    Delete {
        /// Recording id from 'camcord library list'
        id: i64,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "camcord", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    match cli.command {
        None | Some(Commands::Record) => {
            commands::handle_record().await?;
        }
        Some(Commands::Library { action }) => match action {
            LibraryAction::List => commands::handle_library_list().await?,
            LibraryAction::Rename { id, title } => {
                commands::handle_library_rename(id, title).await?
            }
            LibraryAction::Delete { id } => commands::handle_library_delete(id).await?,
        },
        Some(Commands::Auth { clear }) => {
            if let Err(e) = commands::handle_auth(clear).await {
                // Cancellation already showed its own message via cliclack
                let err_msg = e.to_string();
                if err_msg.contains("cancelled") || err_msg.contains("interrupted") {
                    process::exit(0);
                } else {
                    return Err(e);
                }
            }
        }
        Some(Commands::History) => {
            commands::handle_history()?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
