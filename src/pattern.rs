//! `--pattern` name filters shared by the listing commands.

use anyhow::{Context, Result};
use colored::Colorize;
use regex::Regex;

/// Regex filter matched anywhere in a name; no pattern matches everything
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    regex: Option<Regex>,
}

impl NameFilter {
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        let regex = pattern
            .map(|p| Regex::new(p).with_context(|| format!("Invalid pattern '{p}'")))
            .transpose()?;
        Ok(Self { regex })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.as_ref().map_or(true, |r| r.is_match(name))
    }

    /// Remind the operator to quote patterns and echo the one in use
    pub fn announce(&self, what: &str) {
        if let Some(regex) = &self.regex {
            println!(
                "{}",
                "Note: Patterns should be double quoted to avoid shell interpretation, e.g. --pattern \"^dev\"".dimmed()
            );
            println!("Filtering {what} with pattern: {}", regex.as_str().cyan());
        }
    }
}
