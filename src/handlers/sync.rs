//! sync-stream handler
//!
//! Narrates the orchestrator's progress and maps its result to an exit code.

use anyhow::Result;
use colored::Colorize;
use std::future::Future;

use crate::logger;
use crate::sync::{
    CleanupStatus, DirectoryState, SyncEvent, SyncOrchestrator, SyncReport, SyncRequest,
    TransferOutcome,
};

/// Handle sync-stream command, returning the process exit code
pub async fn handle_sync_stream(request: SyncRequest) -> Result<u8> {
    let connector = super::default_connector()?;
    let orchestrator = SyncOrchestrator::new(&connector);

    println!(
        "Syncing stream '{}' to '{}'...",
        request.stream_path().cyan(),
        request.local_path.display()
    );

    let result = orchestrator
        .run(&request, interrupt_signal(), &mut |event: SyncEvent| narrate(&request, &event))
        .await;

    let code = match result {
        Ok(report) => {
            summarize(&request, &report);
            let cleanup = match &report.cleanup {
                CleanupStatus::Deleted => "deleted".to_string(),
                CleanupStatus::Failed(e) => format!("NOT deleted ({e})"),
            };
            record(
                &request,
                &format!("{} via {}, workspace {cleanup}", report.outcome(), report.workspace),
            );
            report.exit_code()
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            record(&request, &format!("failed before transfer: {e}"));
            e.exit_code()
        }
    };

    Ok(code)
}

/// Resolves on the first Ctrl-C. The handler is installed right away so an
/// interrupt never kills the process while a workspace exists.
fn interrupt_signal() -> impl Future<Output = ()> {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, cleaning up...".yellow());
            let _ = tx.send(());
        }
    });

    async move {
        if rx.await.is_err() {
            // No signal handler; never cancel
            std::future::pending::<()>().await;
        }
    }
}

fn narrate(request: &SyncRequest, event: &SyncEvent) {
    match event {
        SyncEvent::DirectoryPrepared { path, state } => match state {
            DirectoryState::Missing => {
                println!("Created workspace directory '{}'", path.display());
            }
            DirectoryState::NonEmptyDirectory => {
                println!("Workspace directory '{}' has been cleared", path.display());
            }
            DirectoryState::EmptyDirectory | DirectoryState::NotADirectory => {}
        },
        SyncEvent::Connected { port, user } => {
            println!("Connected to {port} as {user}");
        }
        SyncEvent::WorkspaceCreated { name } => {
            println!("Created temporary client workspace '{}'", name.cyan());
            if request.writable {
                println!("Files will be made writable after sync");
            }
        }
        SyncEvent::Transferring { .. } => {
            println!("{}", "Syncing files...".bold());
        }
        SyncEvent::Transferred {
            file_count,
            outcome,
        } => {
            println!("Synced {file_count} files ({outcome})");
        }
        SyncEvent::TransferFailed { error } => {
            eprintln!("{} {}", "Transfer failed:".red().bold(), error);
        }
        SyncEvent::WorkspaceDeleted { name } => {
            println!("Deleted temporary client workspace '{name}'");
        }
        SyncEvent::CleanupFailed { name, error } => {
            eprintln!(
                "{} Could not delete temporary client workspace '{}': {}",
                "Warning:".yellow().bold(),
                name,
                error
            );
            eprintln!("  Remove it manually with: p4 client -d {name}");
        }
    }
}

fn summarize(request: &SyncRequest, report: &SyncReport) {
    match &report.transfer {
        Ok(result) if result.outcome == TransferOutcome::Success => {
            println!(
                "\n{} Stream sync completed successfully to '{}'",
                "✓".green(),
                request.local_path.display()
            );
        }
        Ok(result) => {
            println!(
                "\n{} Stream sync finished with {} file error(s):",
                "!".yellow().bold(),
                result.errors.len()
            );
            for error in &result.errors {
                println!("  {}", error.dimmed());
            }
        }
        Err(_) => {
            println!(
                "\n{} Stream sync failed; '{}' may be partially populated",
                "✗".red(),
                request.local_path.display()
            );
        }
    }
}

fn record(request: &SyncRequest, status: &str) {
    let line = format!(
        "sync {} -> {}: {status}",
        request.stream_path(),
        request.local_path.display()
    );
    if let Err(e) = logger::log_to_file(&line) {
        log::debug!("Could not write sync log: {e}");
    }
}
