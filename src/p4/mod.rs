//! Perforce server access.
//!
//! [`Session`] is the seam between the sync core and the server. The
//! production implementation drives the `p4` command-line client; tests
//! substitute an in-memory recording session.

mod cli;
mod connector;
mod spec;
mod tagged;

use async_trait::async_trait;
use thiserror::Error;

pub use cli::P4CliSession;
pub use connector::ProfileConnector;
pub use spec::{ClientOptions, ClientSpec, LineEnd};
pub use tagged::{parse_line, Message, Record, Severity, TaggedLine};

use crate::profile::ProfileError;

/// Failure of a single server command
#[derive(Error, Debug)]
pub enum P4Error {
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' failed: {message}")]
    Command { command: String, message: String },

    #[error("I/O error talking to p4: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected p4 output: {0}")]
    Malformed(String),
}

/// Failure to obtain a session
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Profile '{0}' does not exist")]
    ProfileNotFound(String),

    #[error("Authentication to {port} as {user} failed: {message}")]
    Authentication {
        port: String,
        user: String,
        message: String,
    },

    #[error("Could not run the p4 client: {0}")]
    ClientUnavailable(#[source] std::io::Error),

    #[error(transparent)]
    Store(ProfileError),
}

impl From<ProfileError> for ConnectError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(name) => ConnectError::ProfileNotFound(name),
            other => ConnectError::Store(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depot {
    pub name: String,
    pub depot_type: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Full stream path, e.g. `//main/dev`
    pub path: String,
    pub stream_type: Option<String>,
    pub description: Option<String>,
}

/// Raw result of a `p4 sync` invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutput {
    pub file_count: usize,
    /// Per-file errors reported by the server
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// An authenticated connection to one server as one user
#[async_trait]
pub trait Session: Send + Sync {
    /// User the session is authenticated as
    fn current_user(&self) -> &str;

    /// Server address the session talks to
    fn port(&self) -> &str;

    async fn depots(&self) -> Result<Vec<Depot>, P4Error>;

    /// Streams under `//{depot}/...`
    async fn streams(&self, depot: &str) -> Result<Vec<StreamInfo>, P4Error>;

    /// Create or update a client workspace record
    async fn save_client(&self, spec: &ClientSpec) -> Result<(), P4Error>;

    async fn delete_client(&self, name: &str) -> Result<(), P4Error>;

    /// Sync the head revision of everything mapped by `client`
    async fn sync(&self, client: &str) -> Result<SyncOutput, P4Error>;

    async fn disconnect(&self);
}

/// Source of sessions, keyed by profile name
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    type Session: Session;

    async fn connect(&self, profile: &str) -> Result<Self::Session, ConnectError>;
}
