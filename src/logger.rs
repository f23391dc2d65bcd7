use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::Write;

use crate::config::ConfigManager;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Initialize the logging system
///
/// Console logging is controlled via the `RUST_LOG` environment variable
/// (`error`, `warn`, `info`, `debug`, `trace`; default `info`). Diagnostic
/// output goes to stderr so it never interleaves with listings on stdout.
///
/// Each sync run additionally appends a summary line to
/// `perforce-tools.log` in the config directory, see [`log_to_file`].
///
/// ```bash
/// # Show the p4 commands being executed
/// RUST_LOG=debug phc sync-stream --profile prod --depot main --stream dev --workspace-path ./dev
/// ```
pub fn init_logger() -> Result<()> {
    ConfigManager::ensure_config_dir()?;

    let default_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(default_level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // Ignore error if logger is already initialized

    rotate_log_if_needed()?;

    Ok(())
}

/// Append a timestamped line to the persistent log file
pub fn log_to_file(message: &str) -> Result<()> {
    let log_path = ConfigManager::log_file_path()?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    )?;

    Ok(())
}

/// Rotate log file if it exceeds the size limit
pub fn rotate_log_if_needed() -> Result<()> {
    let log_path = ConfigManager::log_file_path()?;

    if log_path.exists() {
        let metadata = std::fs::metadata(&log_path)?;

        if metadata.len() > MAX_LOG_SIZE {
            let old_log_path = log_path.with_extension("log.old");

            if old_log_path.exists() {
                std::fs::remove_file(&old_log_path)?;
            }

            std::fs::rename(&log_path, &old_log_path)?;

            log::info!("Log file rotated to {}", old_log_path.display());
        }
    }

    Ok(())
}
