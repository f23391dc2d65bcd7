//! Ephemeral client workspaces.
//!
//! A workspace is created right before a transfer and deleted right after
//! it. Nothing outside this module creates or deletes one.

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::SyncRequest;
use crate::p4::{ClientOptions, ClientSpec, LineEnd, P4Error, Session};

/// Tag that marks a client as one of ours
pub const NAME_PREFIX: &str = "temp_sync_";

const DESCRIPTION: &str = "Ephemeral workspace created by phc sync-stream.\n\
                           Deleted when the sync finishes; safe to remove if left behind.";

#[derive(Error, Debug)]
#[error("Failed to create workspace '{name}': {source}")]
pub struct WorkspaceCreationError {
    pub name: String,
    #[source]
    pub source: P4Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingOptions {
    /// Leave synced files writable instead of read-only
    pub writable: bool,
    pub line_end: LineEnd,
}

/// A single-use server-side mapping of a stream onto a local directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceMapping {
    pub name: String,
    pub owner: String,
    pub root: PathBuf,
    pub stream_path: String,
    pub options: MappingOptions,
}

impl WorkspaceMapping {
    pub fn new(name: String, owner: &str, request: &SyncRequest, root: &Path) -> Self {
        Self {
            name,
            owner: owner.to_string(),
            root: root.to_path_buf(),
            stream_path: request.stream_path(),
            options: MappingOptions {
                writable: request.writable,
                line_end: LineEnd::Local,
            },
        }
    }

    /// Spec form sent to the server. The client is always fresh, so
    /// clobbering is allowed; it is never locked.
    pub fn client_spec(&self) -> ClientSpec {
        ClientSpec {
            name: self.name.clone(),
            owner: self.owner.clone(),
            root: self.root.clone(),
            stream: self.stream_path.clone(),
            options: ClientOptions {
                allwrite: self.options.writable,
                clobber: true,
                compress: true,
                locked: false,
                modtime: true,
                rmdir: false,
            },
            line_end: self.options.line_end,
            description: DESCRIPTION.to_string(),
        }
    }
}

/// Name for a workspace owned by process `pid` on `host`
pub fn ephemeral_name(host: &str, pid: u32) -> String {
    format!("{NAME_PREFIX}{}_{pid}", sanitize_host(host))
}

/// Hostname of this machine, or `localhost` if it cannot be read
pub fn local_host() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            log::warn!("Could not read hostname, using 'localhost': {e}");
            "localhost".to_string()
        }
    }
}

fn sanitize_host(host: &str) -> String {
    let sanitized: String = host
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if sanitized.is_empty() {
        "host".to_string()
    } else {
        sanitized
    }
}

/// Register `mapping` on the server
pub async fn create<S: Session + ?Sized>(
    session: &S,
    mapping: &WorkspaceMapping,
) -> Result<(), WorkspaceCreationError> {
    log::debug!(
        "Creating workspace {} for {} at {}",
        mapping.name,
        mapping.stream_path,
        mapping.root.display()
    );

    session
        .save_client(&mapping.client_spec())
        .await
        .map_err(|source| WorkspaceCreationError {
            name: mapping.name.clone(),
            source,
        })
}

/// Delete `mapping` from the server. Failures are logged and returned for
/// reporting, never propagated.
pub async fn destroy<S: Session + ?Sized>(
    session: &S,
    mapping: &WorkspaceMapping,
) -> Result<(), P4Error> {
    log::debug!("Deleting workspace {}", mapping.name);

    let result = session.delete_client(&mapping.name).await;
    if let Err(e) = &result {
        log::warn!("Failed to delete workspace '{}': {e}", mapping.name);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request(writable: bool) -> SyncRequest {
        SyncRequest {
            profile: "prod".to_string(),
            depot: "main".to_string(),
            stream: "dev".to_string(),
            local_path: PathBuf::from("/ws/dev"),
            force: false,
            writable,
        }
    }

    #[rstest]
    #[case("build01", 42, "temp_sync_build01_42")]
    #[case("build01.corp.example.com", 7, "temp_sync_build01_corp_example_com_7")]
    #[case("dev-box 2", 1234, "temp_sync_dev_box_2_1234")]
    #[case("", 1, "temp_sync_host_1")]
    fn test_ephemeral_name(#[case] host: &str, #[case] pid: u32, #[case] expected: &str) {
        assert_eq!(ephemeral_name(host, pid), expected);
    }

    #[test]
    fn test_names_differ_by_host_and_pid() {
        let base = ephemeral_name("build01", 100);
        assert_ne!(base, ephemeral_name("build01", 101));
        assert_ne!(base, ephemeral_name("build02", 100));
        assert!(base.starts_with(NAME_PREFIX));
    }

    #[test]
    fn test_local_host_is_not_empty() {
        assert!(!local_host().is_empty());
    }

    #[rstest]
    #[case(false, "noallwrite clobber compress unlocked modtime normdir")]
    #[case(true, "allwrite clobber compress unlocked modtime normdir")]
    fn test_client_spec_options(#[case] writable: bool, #[case] options: &str) {
        let mapping = WorkspaceMapping::new(
            ephemeral_name("build01", 42),
            "alice",
            &request(writable),
            Path::new("/ws/dev"),
        );

        let spec = mapping.client_spec();
        assert_eq!(spec.options.render(), options);
        assert_eq!(spec.stream, "//main/dev");
        assert_eq!(spec.owner, "alice");
        assert_eq!(spec.root, PathBuf::from("/ws/dev"));
        assert_eq!(spec.line_end, LineEnd::Local);
    }
}
