//! Error taxonomy of a sync run and its mapping to process exit codes.

use thiserror::Error;

use crate::p4::{ConnectError, P4Error};
use crate::sync::{ReconcileError, WorkspaceCreationError};

pub const EXIT_PARTIAL: u8 = 1;
pub const EXIT_PRECONDITION: u8 = 2;
pub const EXIT_CONNECTION: u8 = 3;
pub const EXIT_WORKSPACE: u8 = 4;
pub const EXIT_TRANSFER: u8 = 5;
pub const EXIT_CANCELLED: u8 = 130;

#[derive(Error, Debug)]
pub enum SyncError {
    /// Bad local path; nothing on the server was touched
    #[error(transparent)]
    Precondition(#[from] ReconcileError),

    #[error(transparent)]
    Connection(#[from] ConnectError),

    #[error(transparent)]
    WorkspaceCreation(#[from] WorkspaceCreationError),

    #[error("Transfer failed: {0}")]
    Transfer(#[source] P4Error),

    #[error("Transfer cancelled")]
    Cancelled,
}

impl SyncError {
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Precondition(_) => EXIT_PRECONDITION,
            SyncError::Connection(_) => EXIT_CONNECTION,
            SyncError::WorkspaceCreation(_) => EXIT_WORKSPACE,
            SyncError::Transfer(_) => EXIT_TRANSFER,
            SyncError::Cancelled => EXIT_CANCELLED,
        }
    }
}
