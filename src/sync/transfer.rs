//! Bulk transfer against an ephemeral workspace.

use std::fmt;

use super::workspace::WorkspaceMapping;
use crate::p4::{P4Error, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Success,
    /// The sync completed but some files were skipped or failed
    PartialFailure,
    /// The sync call itself failed
    Failure,
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransferOutcome::Success => "success",
            TransferOutcome::PartialFailure => "partial failure",
            TransferOutcome::Failure => "failure",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    pub file_count: usize,
    pub outcome: TransferOutcome,
    /// Per-file errors reported by the server
    pub errors: Vec<String>,
}

/// Sync everything mapped by `mapping`. Which files move is decided by the
/// server. A failed call is returned as-is; there are no retries here.
pub async fn execute<S: Session + ?Sized>(
    session: &S,
    mapping: &WorkspaceMapping,
) -> Result<TransferResult, P4Error> {
    let output = session.sync(&mapping.name).await?;

    for warning in &output.warnings {
        log::debug!("sync: {warning}");
    }

    let outcome = if output.errors.is_empty() {
        TransferOutcome::Success
    } else {
        TransferOutcome::PartialFailure
    };

    Ok(TransferResult {
        file_count: output.file_count,
        outcome,
        errors: output.errors,
    })
}
