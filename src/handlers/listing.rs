//! Depot and stream listing handlers

use anyhow::{Context, Result};
use colored::Colorize;

use crate::p4::Session;
use crate::pattern::NameFilter;

/// Handle list-depots command
pub async fn handle_list_depots(profile: &str, pattern: Option<&str>) -> Result<()> {
    let filter = NameFilter::new(pattern)?;
    let session = super::connect(profile).await?;

    println!("Listing depots...");
    let depots = session.depots().await.context("Failed to list depots");
    session.disconnect().await;
    let depots = depots?;

    filter.announce("depots");
    let depots: Vec<_> = depots.iter().filter(|d| filter.matches(&d.name)).collect();

    if depots.is_empty() {
        println!("{}", "No depots found.".dimmed());
        return Ok(());
    }

    println!("\n{}", "Depots:".bold());
    for depot in depots {
        println!("  {} - {}", depot.name.cyan(), depot.description);
    }

    Ok(())
}

/// Handle list-streams command
pub async fn handle_list_streams(profile: &str, depot: &str, pattern: Option<&str>) -> Result<()> {
    let filter = NameFilter::new(pattern)?;
    let session = super::connect(profile).await?;

    println!("Listing streams in depot '{}'...", depot);
    let streams = session
        .streams(depot)
        .await
        .with_context(|| format!("Failed to list streams in depot '{depot}'"));
    session.disconnect().await;
    let streams = streams?;

    filter.announce("streams");
    let streams: Vec<_> = streams.iter().filter(|s| filter.matches(&s.path)).collect();

    if streams.is_empty() {
        println!("{}", "No streams found.".dimmed());
        return Ok(());
    }

    println!("\n{}", "Streams:".bold());
    for stream in streams {
        println!(
            "  {} - {} - {}",
            stream.path.cyan(),
            stream.stream_type.as_deref().unwrap_or("N/A"),
            stream.description.as_deref().unwrap_or("No description")
        );
    }

    Ok(())
}
