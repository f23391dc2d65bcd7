//! Syncing a stream into a local directory through an ephemeral workspace.
//!
//! A run walks through these stages in order:
//!
//! 1. prepare the local directory ([`prepare`])
//! 2. connect with the requested profile
//! 3. create a single-use workspace ([`WorkspaceMapping`])
//! 4. transfer files
//! 5. delete the workspace
//!
//! A failure in stages 1-3 ends the run. Once the workspace exists, stage 5
//! runs no matter how stage 4 ended, including cancellation.

mod reconcile;
mod transfer;
mod workspace;

pub use reconcile::{inspect, prepare, DirectoryState, ReconcileError};
pub use transfer::{TransferOutcome, TransferResult};
pub use workspace::{
    ephemeral_name, local_host, MappingOptions, WorkspaceCreationError, WorkspaceMapping,
    NAME_PREFIX,
};

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::error::{SyncError, EXIT_PARTIAL};
use crate::p4::{ConnectionProvider, Session};

/// Input to one sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub profile: String,
    pub depot: String,
    pub stream: String,
    pub local_path: PathBuf,
    /// Clear a non-empty target directory instead of refusing
    pub force: bool,
    /// Leave synced files writable
    pub writable: bool,
}

impl SyncRequest {
    /// `//{depot}/{stream}`
    pub fn stream_path(&self) -> String {
        format!(
            "//{}/{}",
            self.depot.trim_matches('/'),
            self.stream.trim_matches('/')
        )
    }
}

/// Progress notifications emitted while a run advances
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    DirectoryPrepared { path: PathBuf, state: DirectoryState },
    Connected { port: String, user: String },
    WorkspaceCreated { name: String },
    Transferring { stream_path: String, root: PathBuf },
    Transferred { file_count: usize, outcome: TransferOutcome },
    TransferFailed { error: String },
    WorkspaceDeleted { name: String },
    CleanupFailed { name: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupStatus {
    Deleted,
    Failed(String),
}

/// Result of a run that got as far as creating its workspace
#[derive(Debug)]
pub struct SyncReport {
    pub workspace: String,
    pub transfer: Result<TransferResult, SyncError>,
    pub cleanup: CleanupStatus,
}

impl SyncReport {
    pub fn outcome(&self) -> TransferOutcome {
        match &self.transfer {
            Ok(result) => result.outcome,
            Err(_) => TransferOutcome::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome() == TransferOutcome::Success
    }

    /// Process exit code. Cleanup status never affects it.
    pub fn exit_code(&self) -> u8 {
        match &self.transfer {
            Ok(result) if result.outcome == TransferOutcome::Success => 0,
            Ok(_) => EXIT_PARTIAL,
            Err(e) => e.exit_code(),
        }
    }
}

/// Runs sync requests against sessions from a [`ConnectionProvider`]
pub struct SyncOrchestrator<'a, P> {
    provider: &'a P,
    host: String,
    pid: u32,
}

impl<'a, P: ConnectionProvider> SyncOrchestrator<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            host: local_host(),
            pid: std::process::id(),
        }
    }

    /// Override the host and process identity used for workspace names
    pub fn with_identity(mut self, host: impl Into<String>, pid: u32) -> Self {
        self.host = host.into();
        self.pid = pid;
        self
    }

    pub fn workspace_name(&self) -> String {
        ephemeral_name(&self.host, self.pid)
    }

    /// Execute `request`. Resolving `cancel` before the workspace exists
    /// stops the run with no server state left behind; resolving it during
    /// the transfer aborts the transfer and the workspace is still deleted.
    ///
    /// Returns `Err` only for failures before the workspace exists. From
    /// then on the outcome is carried in the [`SyncReport`].
    pub async fn run<C>(
        &self,
        request: &SyncRequest,
        cancel: C,
        on_event: &mut dyn FnMut(SyncEvent),
    ) -> Result<SyncReport, SyncError>
    where
        C: Future<Output = ()>,
    {
        let state = prepare(&request.local_path, request.force)?;
        on_event(SyncEvent::DirectoryPrepared {
            path: request.local_path.clone(),
            state,
        });

        let root = std::path::absolute(&request.local_path).map_err(|source| {
            ReconcileError::Io {
                path: request.local_path.clone(),
                source,
            }
        })?;

        tokio::pin!(cancel);

        let session = tokio::select! {
            biased;
            () = &mut cancel => {
                log::warn!("Sync of {} cancelled before connecting", request.stream_path());
                return Err(SyncError::Cancelled);
            }
            session = self.provider.connect(&request.profile) => session?,
        };
        on_event(SyncEvent::Connected {
            port: session.port().to_string(),
            user: session.current_user().to_string(),
        });

        let mapping =
            WorkspaceMapping::new(self.workspace_name(), session.current_user(), request, &root);

        if is_resolved(cancel.as_mut()).await {
            log::warn!("Sync of {} cancelled before creating a workspace", mapping.stream_path);
            session.disconnect().await;
            return Err(SyncError::Cancelled);
        }

        if let Err(e) = workspace::create(&session, &mapping).await {
            session.disconnect().await;
            return Err(e.into());
        }
        on_event(SyncEvent::WorkspaceCreated {
            name: mapping.name.clone(),
        });

        on_event(SyncEvent::Transferring {
            stream_path: mapping.stream_path.clone(),
            root: mapping.root.clone(),
        });
        let transfer = {
            tokio::select! {
                result = transfer::execute(&session, &mapping) => result.map_err(SyncError::Transfer),
                () = &mut cancel => {
                    log::warn!("Transfer into {} cancelled", mapping.root.display());
                    Err(SyncError::Cancelled)
                }
            }
        };
        match &transfer {
            Ok(result) => on_event(SyncEvent::Transferred {
                file_count: result.file_count,
                outcome: result.outcome,
            }),
            Err(e) => on_event(SyncEvent::TransferFailed {
                error: e.to_string(),
            }),
        }

        let cleanup = match workspace::destroy(&session, &mapping).await {
            Ok(()) => {
                on_event(SyncEvent::WorkspaceDeleted {
                    name: mapping.name.clone(),
                });
                CleanupStatus::Deleted
            }
            Err(e) => {
                on_event(SyncEvent::CleanupFailed {
                    name: mapping.name.clone(),
                    error: e.to_string(),
                });
                CleanupStatus::Failed(e.to_string())
            }
        };

        session.disconnect().await;

        Ok(SyncReport {
            workspace: mapping.name,
            transfer,
            cleanup,
        })
    }
}

/// Poll `future` once without waiting
async fn is_resolved<F: Future<Output = ()>>(future: Pin<&mut F>) -> bool {
    tokio::select! {
        biased;
        () = future => true,
        () = std::future::ready(()) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::p4::P4Error;
    use rstest::rstest;

    #[rstest]
    #[case("main", "dev", "//main/dev")]
    #[case("//main", "/dev/", "//main/dev")]
    #[case("games", "release/1.0", "//games/release/1.0")]
    fn test_stream_path(#[case] depot: &str, #[case] stream: &str, #[case] expected: &str) {
        let request = SyncRequest {
            profile: "prod".to_string(),
            depot: depot.to_string(),
            stream: stream.to_string(),
            local_path: PathBuf::from("/ws"),
            force: false,
            writable: false,
        };
        assert_eq!(request.stream_path(), expected);
    }

    fn report(transfer: Result<TransferResult, SyncError>, cleanup: CleanupStatus) -> SyncReport {
        SyncReport {
            workspace: "temp_sync_h_1".to_string(),
            transfer,
            cleanup,
        }
    }

    fn result(outcome: TransferOutcome) -> TransferResult {
        TransferResult {
            file_count: 3,
            outcome,
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_cleanup_failure_does_not_change_exit_code() {
        let ok = report(
            Ok(result(TransferOutcome::Success)),
            CleanupStatus::Failed("denied".to_string()),
        );
        assert!(ok.is_success());
        assert_eq!(ok.exit_code(), 0);
    }

    #[test]
    fn test_report_exit_codes() {
        let partial = report(Ok(result(TransferOutcome::PartialFailure)), CleanupStatus::Deleted);
        assert!(!partial.is_success());
        assert_eq!(partial.exit_code(), EXIT_PARTIAL);

        let failed = report(
            Err(SyncError::Transfer(P4Error::Malformed("x".to_string()))),
            CleanupStatus::Deleted,
        );
        assert_eq!(failed.outcome(), TransferOutcome::Failure);
        assert_eq!(failed.exit_code(), crate::error::EXIT_TRANSFER);
    }
}
