//! Session settings exposed as a remote configuration store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use transctl_core::{ConfigBackend, ProviderResult};

use crate::client::{NoArguments, TransmissionClient};

/// Remote configuration backed by `session-get` / `session-set`.
pub struct SessionBackend {
    client: TransmissionClient,
}

impl SessionBackend {
    /// Bind to a client session.
    #[must_use]
    pub const fn new(client: TransmissionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigBackend for SessionBackend {
    async fn load(&self) -> ProviderResult<Map<String, Value>> {
        self.client.call("session-get", &NoArguments {}).await
    }

    async fn store(&self, changes: Map<String, Value>) -> ProviderResult<()> {
        self.client
            .call::<_, Value>("session-set", &changes)
            .await
            .map(drop)
    }
}
