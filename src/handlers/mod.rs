//! Command handler modules
//!
//! One function per CLI subcommand, grouped by area.

pub mod listing;
pub mod profiles;
pub mod sync;

pub use listing::{handle_list_depots, handle_list_streams};
pub use profiles::{handle_delete_profile, handle_list_profiles, handle_save_profile};
pub use sync::handle_sync_stream;

use anyhow::{Context, Result};

use crate::p4::{ConnectionProvider, P4CliSession, ProfileConnector, Session};
use crate::profile::ProfileStore;

/// Check if we're running in an interactive terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

pub(crate) fn default_connector() -> Result<ProfileConnector> {
    let store = ProfileStore::open_default().context("Failed to open profile store")?;
    Ok(ProfileConnector::new(store))
}

/// Connect with `profile` and print who we are connected as
pub(crate) async fn connect(profile: &str) -> Result<P4CliSession> {
    let session = default_connector()?
        .connect(profile)
        .await
        .context("Failed to connect to Perforce server")?;
    println!("Connected to {} as {}", session.port(), session.current_user());
    Ok(session)
}
