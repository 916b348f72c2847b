//! Daemon preferences exposed as a remote configuration store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use transctl_core::{ConfigBackend, ProviderResult};

use crate::client::QbitClient;
use crate::request::{AppSetPreferences, Plain};

/// Remote configuration backed by `app/preferences` / `app/setPreferences`.
pub struct PreferencesBackend {
    client: QbitClient,
}

impl PreferencesBackend {
    /// Bind to a client session.
    #[must_use]
    pub const fn new(client: QbitClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigBackend for PreferencesBackend {
    async fn load(&self) -> ProviderResult<Map<String, Value>> {
        self.client.json(&Plain::PREFERENCES).await
    }

    async fn store(&self, changes: Map<String, Value>) -> ProviderResult<()> {
        self.client.send(&AppSetPreferences::from(changes)).await
    }
}
