//! Protocol name to provider constructor.

use std::collections::BTreeMap;

use tracing::debug;
use transctl_core::{Provider, ProviderResult, SessionConfig};
use transctl_qbittorrent::QbitProvider;
use transctl_transmission::TransmissionProvider;
use url::Url;

use crate::client::{CliError, CliResult};

type Constructor = fn(&SessionConfig) -> ProviderResult<Box<dyn Provider>>;

fn transmission(session: &SessionConfig) -> ProviderResult<Box<dyn Provider>> {
    Ok(Box::new(TransmissionProvider::connect(session)?))
}

fn qbittorrent(session: &SessionConfig) -> ProviderResult<Box<dyn Provider>> {
    Ok(Box::new(QbitProvider::connect(session)?))
}

pub(crate) struct ProviderRegistry {
    constructors: BTreeMap<&'static str, Constructor>,
}

impl ProviderRegistry {
    pub(crate) fn with_defaults() -> Self {
        let mut registry = Self {
            constructors: BTreeMap::new(),
        };
        registry.register(transctl_transmission::PROVIDER_NAME, transmission);
        registry.register(transctl_qbittorrent::PROVIDER_NAME, qbittorrent);
        registry
    }

    pub(crate) fn register(&mut self, name: &'static str, constructor: Constructor) {
        self.constructors.insert(name, constructor);
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    /// Build the named provider, inferring the protocol from the URL when unnamed.
    pub(crate) fn build(
        &self,
        name: Option<&str>,
        session: &SessionConfig,
    ) -> CliResult<Box<dyn Provider>> {
        let name = name.map_or_else(|| infer(&session.url), str::trim);
        let constructor = self.constructors.get(name).ok_or_else(|| {
            CliError::validation(format!(
                "unknown provider '{name}' (expected one of: {})",
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })?;
        debug!(provider = name, url = %session.url, "connecting");
        constructor(session).map_err(CliError::from)
    }
}

/// `qbittorrent` for WebUI API paths, `transmission` otherwise.
pub(crate) fn infer(url: &Url) -> &'static str {
    if url.path().contains("/api/v2") {
        transctl_qbittorrent::PROVIDER_NAME
    } else {
        transctl_transmission::PROVIDER_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_follows_url_path() -> Result<(), url::ParseError> {
        assert_eq!(infer(&Url::parse("http://nas:8080/api/v2/")?), "qbittorrent");
        assert_eq!(
            infer(&Url::parse("http://localhost:9091/transmission/rpc/")?),
            "transmission"
        );
        Ok(())
    }

    #[test]
    fn unknown_names_are_rejected() -> Result<(), url::ParseError> {
        let registry = ProviderRegistry::with_defaults();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["qbittorrent", "transmission"]
        );
        let session = SessionConfig::new(Url::parse("http://localhost:9091/")?);
        let Err(err) = registry.build(Some("deluge"), &session) else {
            panic!("deluge is not registered");
        };
        assert_eq!(
            err.display_message(),
            "unknown provider 'deluge' (expected one of: qbittorrent, transmission)"
        );
        Ok(())
    }
}
