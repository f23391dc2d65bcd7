//! Recording in-memory Perforce session for orchestrator tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use perforce_tools::p4::{
    ClientSpec, ConnectError, ConnectionProvider, Depot, P4Error, Session, StreamInfo, SyncOutput,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(String),
    SaveClient(ClientSpec),
    Sync(String),
    DeleteClient(String),
    Disconnect,
}

#[derive(Debug, Clone)]
pub enum SyncBehavior {
    Files(usize),
    Partial(usize, Vec<String>),
    Error(String),
    /// Never completes; only cancellation ends the transfer
    Hang,
}

#[derive(Debug, Clone)]
pub struct Behavior {
    pub fail_connect: bool,
    /// Login never completes
    pub hang_connect: bool,
    pub fail_create: bool,
    pub fail_delete: bool,
    pub sync: SyncBehavior,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            fail_connect: false,
            hang_connect: false,
            fail_create: false,
            fail_delete: false,
            sync: SyncBehavior::Files(0),
        }
    }
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub struct MockSession {
    calls: CallLog,
    behavior: Behavior,
}

#[async_trait]
impl Session for MockSession {
    fn current_user(&self) -> &str {
        "alice"
    }

    fn port(&self) -> &str {
        "ssl:p4.test:1666"
    }

    async fn depots(&self) -> Result<Vec<Depot>, P4Error> {
        Ok(Vec::new())
    }

    async fn streams(&self, _depot: &str) -> Result<Vec<StreamInfo>, P4Error> {
        Ok(Vec::new())
    }

    async fn save_client(&self, spec: &ClientSpec) -> Result<(), P4Error> {
        self.calls.lock().unwrap().push(Call::SaveClient(spec.clone()));
        if self.behavior.fail_create {
            return Err(P4Error::Command {
                command: "p4 client -i".to_string(),
                message: "Stream //main/missing doesn't exist.".to_string(),
            });
        }
        Ok(())
    }

    async fn delete_client(&self, name: &str) -> Result<(), P4Error> {
        self.calls.lock().unwrap().push(Call::DeleteClient(name.to_string()));
        if self.behavior.fail_delete {
            return Err(P4Error::Command {
                command: format!("p4 client -d {name}"),
                message: "You don't have permission for this operation.".to_string(),
            });
        }
        Ok(())
    }

    async fn sync(&self, client: &str) -> Result<SyncOutput, P4Error> {
        self.calls.lock().unwrap().push(Call::Sync(client.to_string()));
        match &self.behavior.sync {
            SyncBehavior::Files(count) => Ok(SyncOutput {
                file_count: *count,
                ..Default::default()
            }),
            SyncBehavior::Partial(count, errors) => Ok(SyncOutput {
                file_count: *count,
                errors: errors.clone(),
                warnings: Vec::new(),
            }),
            SyncBehavior::Error(message) => Err(P4Error::Command {
                command: format!("p4 -c {client} sync"),
                message: message.clone(),
            }),
            SyncBehavior::Hang => std::future::pending().await,
        }
    }

    async fn disconnect(&self) {
        self.calls.lock().unwrap().push(Call::Disconnect);
    }
}

#[derive(Default)]
pub struct MockProvider {
    pub calls: CallLog,
    pub behavior: Behavior,
}

impl MockProvider {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            calls: CallLog::default(),
            behavior,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Names passed to `delete_client`
    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeleteClient(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn created_specs(&self) -> Vec<ClientSpec> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SaveClient(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ConnectionProvider for MockProvider {
    type Session = MockSession;

    async fn connect(&self, profile: &str) -> Result<MockSession, ConnectError> {
        self.calls.lock().unwrap().push(Call::Connect(profile.to_string()));
        if profile == "unknown" {
            return Err(ConnectError::ProfileNotFound(profile.to_string()));
        }
        if self.behavior.hang_connect {
            std::future::pending::<()>().await;
        }
        if self.behavior.fail_connect {
            return Err(ConnectError::Authentication {
                port: "ssl:p4.test:1666".to_string(),
                user: "alice".to_string(),
                message: "Password invalid.".to_string(),
            });
        }
        Ok(MockSession {
            calls: Arc::clone(&self.calls),
            behavior: self.behavior.clone(),
        })
    }
}
