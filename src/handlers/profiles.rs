//! Profile management handlers
//!
//! Save, delete and list the connection profiles in `profiles.toml`.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use inquire::{Confirm, Password};
use std::io::BufRead;

use super::is_interactive;
use crate::p4::{P4CliSession, Session};
use crate::pattern::NameFilter;
use crate::profile::{Profile, ProfileStore};

/// Handle save-profile command
///
/// Logs in with the given credentials first; the profile is only written
/// when the login succeeds.
pub async fn handle_save_profile(name: &str, host: &str, username: &str) -> Result<()> {
    let password = read_password()?;

    println!("Testing connection to {} with username {}...", host.cyan(), username.cyan());
    let session = P4CliSession::login(host, username, &password)
        .await
        .with_context(|| {
            format!("Failed to save profile '{name}'. Please check your connection details")
        })?;
    session.disconnect().await;

    let store = ProfileStore::open_default()?;
    store
        .save(
            name,
            Profile {
                host: host.to_string(),
                username: username.to_string(),
                password,
            },
        )
        .context("Failed to save profile")?;

    println!("{} Profile '{}' saved successfully.", "✓".green(), name.bold());
    Ok(())
}

/// Handle delete-profile command
pub fn handle_delete_profile(name: &str, assume_yes: bool) -> Result<()> {
    let store = ProfileStore::open_default()?;
    let profile = store.get(name)?;

    println!("{} {}", "Profile:".bold(), name);
    println!("{} {}", "Host:".bold(), profile.host);
    println!("{} {}", "Username:".bold(), profile.username);

    if !assume_yes {
        if !is_interactive() {
            bail!("Refusing to delete profile '{name}' without confirmation. Pass --yes to confirm.");
        }

        let confirm = Confirm::new("Are you sure you want to delete this profile?")
            .with_default(false)
            .prompt()
            .context("Failed to get confirmation")?;

        if !confirm {
            println!("{}", "Profile deletion cancelled.".yellow());
            return Ok(());
        }
    }

    store.delete(name)?;
    println!("{} Profile '{}' deleted successfully.", "✓".green(), name.bold());
    Ok(())
}

/// Handle list-profiles command. Passwords are never shown.
pub fn handle_list_profiles(pattern: Option<&str>) -> Result<()> {
    let filter = NameFilter::new(pattern)?;
    let store = ProfileStore::open_default()?;
    let profiles = store.list()?;

    if profiles.is_empty() {
        println!("{}", "No profiles found.".dimmed());
        return Ok(());
    }

    filter.announce("profiles");
    let matching: Vec<_> = profiles
        .iter()
        .filter(|(name, _)| filter.matches(name))
        .collect();

    if matching.is_empty() {
        println!("{}", "No profiles found matching the pattern.".dimmed());
        return Ok(());
    }

    println!("\n{}", "Profiles:".bold());
    for (name, profile) in matching {
        println!(
            "  {} - Host: {} - Username: {}",
            name.cyan(),
            profile.host,
            profile.username
        );
    }

    Ok(())
}

/// Prompt for the password, or read one line from stdin when piped
fn read_password() -> Result<String> {
    if is_interactive() {
        return Password::new("Enter Perforce password:")
            .without_confirmation()
            .prompt()
            .context("Failed to read password");
    }

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
