use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use perforce_tools::handlers;
use perforce_tools::logger;
use perforce_tools::sync::SyncRequest;

#[derive(Parser)]
#[command(name = "phc")]
#[command(about = "Command-line tools for interacting with a Perforce Helix Core server", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a named connection profile after testing it
    SaveProfile {
        /// Profile name to save
        #[arg(long)]
        profile: String,

        /// Perforce server host (e.g. ssl:localhost:1666)
        #[arg(long)]
        host: String,

        /// Perforce username
        #[arg(long)]
        username: String,
    },

    /// Delete a saved profile
    DeleteProfile {
        /// Profile name to delete
        #[arg(long)]
        profile: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List saved profiles (passwords are never shown)
    ListProfiles {
        /// Regex filter on profile names (quote it to avoid shell interpretation)
        #[arg(long)]
        pattern: Option<String>,
    },

    /// List depots on the server
    ListDepots {
        /// Profile name to use for connection
        #[arg(long)]
        profile: String,

        /// Regex filter on depot names
        #[arg(long)]
        pattern: Option<String>,
    },

    /// List streams in a depot
    ListStreams {
        /// Profile name to use for connection
        #[arg(long)]
        profile: String,

        /// Depot name to list streams from
        #[arg(long)]
        depot: String,

        /// Regex filter on stream paths
        #[arg(long)]
        pattern: Option<String>,
    },

    /// Sync a stream into a local directory through a temporary workspace
    SyncStream {
        /// Profile name to use for connection
        #[arg(long)]
        profile: String,

        /// Depot name containing the stream
        #[arg(long)]
        depot: String,

        /// Stream name to sync
        #[arg(long)]
        stream: String,

        /// Directory to sync the stream into
        #[arg(long, visible_alias = "path")]
        workspace_path: PathBuf,

        /// Clear the directory first if it is not empty
        #[arg(long)]
        force: bool,

        /// Leave synced files writable
        #[arg(long)]
        writable: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logger::init_logger() {
        eprintln!("{} Logging to file disabled: {e:#}", "Warning:".yellow());
    }

    match run(cli.command).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<u8> {
    match command {
        Commands::SaveProfile {
            profile,
            host,
            username,
        } => {
            handlers::handle_save_profile(&profile, &host, &username).await?;
        }
        Commands::DeleteProfile { profile, yes } => {
            handlers::handle_delete_profile(&profile, yes)?;
        }
        Commands::ListProfiles { pattern } => {
            handlers::handle_list_profiles(pattern.as_deref())?;
        }
        Commands::ListDepots { profile, pattern } => {
            handlers::handle_list_depots(&profile, pattern.as_deref()).await?;
        }
        Commands::ListStreams {
            profile,
            depot,
            pattern,
        } => {
            handlers::handle_list_streams(&profile, &depot, pattern.as_deref()).await?;
        }
        Commands::SyncStream {
            profile,
            depot,
            stream,
            workspace_path,
            force,
            writable,
        } => {
            let request = SyncRequest {
                profile,
                depot,
                stream,
                local_path: workspace_path,
                force,
                writable,
            };
            return handlers::handle_sync_stream(request).await;
        }
    }

    Ok(0)
}
