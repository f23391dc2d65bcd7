use async_trait::async_trait;

use super::{ConnectError, ConnectionProvider, P4CliSession};
use crate::profile::ProfileStore;

/// Opens [`P4CliSession`]s for profiles saved in a [`ProfileStore`]
pub struct ProfileConnector {
    store: ProfileStore,
}

impl ProfileConnector {
    pub fn new(store: ProfileStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ConnectionProvider for ProfileConnector {
    type Session = P4CliSession;

    async fn connect(&self, profile: &str) -> Result<P4CliSession, ConnectError> {
        let profile = self.store.get(profile)?;
        P4CliSession::login(&profile.host, &profile.username, &profile.password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unknown_profile() {
        let temp = TempDir::new().unwrap();
        let connector = ProfileConnector::new(ProfileStore::at(temp.path().join("profiles.toml")));

        let result = connector.connect("missing").await;
        assert!(matches!(result, Err(ConnectError::ProfileNotFound(name)) if name == "missing"));
    }
}
