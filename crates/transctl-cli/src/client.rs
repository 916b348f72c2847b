//! Shared CLI plumbing: error type, per-invocation context, and session
//! resolution from flags, the local config, and netrc.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

use anyhow::{Context as _, anyhow};
use tokio::sync::OnceCell;
use tracing::debug;
use transctl_config::{Context, LocalConfig, Netrc, config_path};
use transctl_core::{Credentials, Provider, SessionConfig};
use transctl_transmission::DEFAULT_URL;
use url::Url;

use crate::cli::GlobalArgs;
use crate::registry::ProviderRegistry;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) | Self::Failure(_) => 1,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

impl From<transctl_core::ProviderError> for CliError {
    fn from(error: transctl_core::ProviderError) -> Self {
        Self::failure(error)
    }
}

impl From<transctl_config::ConfigError> for CliError {
    fn from(error: transctl_config::ConfigError) -> Self {
        Self::failure(error)
    }
}

impl From<transctl_select::SelectError> for CliError {
    fn from(error: transctl_select::SelectError) -> Self {
        match error {
            transctl_select::SelectError::Provider { source } => Self::failure(source),
            other => Self::validation(other.to_string()),
        }
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext {
    pub(crate) config: LocalConfig,
    pub(crate) globals: GlobalArgs,
    registry: ProviderRegistry,
    provider: OnceCell<Box<dyn Provider>>,
}

impl AppContext {
    /// Load the local config and check the active context exists.
    pub(crate) async fn load(globals: GlobalArgs) -> CliResult<Self> {
        let path = config_path(globals.config.as_deref())?;
        let config = LocalConfig::open(&path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))
            .map_err(CliError::failure)?;
        config.context(globals.context.as_deref())?;
        Ok(Self {
            config,
            globals,
            registry: ProviderRegistry::with_defaults(),
            provider: OnceCell::new(),
        })
    }

    /// Active context view over the loaded config.
    pub(crate) fn settings(&self) -> CliResult<Context<'_>> {
        Ok(self.config.context(self.globals.context.as_deref())?)
    }

    /// The daemon session, connected on first use.
    pub(crate) async fn provider(&self) -> CliResult<&dyn Provider> {
        let provider = self
            .provider
            .get_or_try_init(|| async { self.connect().await })
            .await?;
        Ok(provider.as_ref())
    }

    async fn connect(&self) -> CliResult<Box<dyn Provider>> {
        let session = self.session_config().await?;
        let settings = self.settings()?;
        let name = settings.lookup("provider");
        self.registry.build(name, &session)
    }

    /// Resolve URL, timeout, retries, and credentials for the session.
    pub(crate) async fn session_config(&self) -> CliResult<SessionConfig> {
        let settings = self.settings()?;
        let url = self.daemon_url(&settings)?;
        let timeout = settings.timeout(self.globals.timeout.as_deref())?;
        let retries = settings.retries()?;
        let credentials = self.credentials(&settings, &url).await?;
        debug!(%url, ?timeout, retries, has_credentials = credentials.is_some(), "resolved session");
        Ok(SessionConfig::new(url)
            .with_timeout(timeout)
            .with_retries(retries)
            .with_credentials(credentials))
    }

    fn daemon_url(&self, settings: &Context<'_>) -> CliResult<Url> {
        let base = match settings.url(self.globals.url.as_deref())? {
            Some(url) => url,
            None => Url::parse(DEFAULT_URL).map_err(CliError::failure)?,
        };
        compose_url(
            &base,
            self.globals.proto.as_deref(),
            self.globals.host.as_deref(),
            self.globals.rpc_path.as_deref(),
        )
    }

    async fn credentials(&self, settings: &Context<'_>, url: &Url) -> CliResult<Option<Credentials>> {
        if let Some(user) = settings.resolve_value(self.globals.user.as_deref(), "user") {
            return parse_user(&user).map(Some);
        }
        if Credentials::from_url(url).is_some() || self.globals.no_netrc {
            return Ok(None);
        }
        let Some(path) = self.netrc_path() else {
            return Ok(None);
        };
        let Some(netrc) = Netrc::load(&path).await? else {
            return Ok(None);
        };
        let credentials = url
            .host_str()
            .and_then(|host| netrc.machine(host))
            .and_then(transctl_config::Machine::credentials);
        debug!(path = %path.display(), found = credentials.is_some(), "consulted netrc");
        Ok(credentials)
    }

    fn netrc_path(&self) -> Option<PathBuf> {
        self.globals.netrc_file.clone().or_else(Netrc::default_path)
    }
}

/// Apply `--proto`, `--host`, and `--rpc-path` over a base URL.
pub(crate) fn compose_url(
    base: &Url,
    proto: Option<&str>,
    host: Option<&str>,
    rpc_path: Option<&str>,
) -> CliResult<Url> {
    if proto.is_none() && host.is_none() && rpc_path.is_none() {
        return Ok(base.clone());
    }
    let base_host = match (base.host_str(), base.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };
    let proto = proto.unwrap_or_else(|| base.scheme());
    let host = host.unwrap_or(&base_host);
    let path = rpc_path.unwrap_or_else(|| base.path());
    let separator = if path.starts_with('/') { "" } else { "/" };
    let composed = format!("{proto}://{host}{separator}{path}");
    Url::parse(&composed)
        .map_err(|err| CliError::validation(format!("invalid daemon URL {composed:?}: {err}")))
}

/// Split `user[:password]`, prompting for a missing password.
pub(crate) fn parse_user(raw: &str) -> CliResult<Credentials> {
    if let Some((user, password)) = raw.split_once(':') {
        return Ok(Credentials::new(user, password));
    }
    let password = rpassword::prompt_password(format!("Password for {raw}: "))
        .map_err(|err| CliError::failure(anyhow!("failed to read password: {err}")))?;
    Ok(Credentials::new(raw, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("valid URL")
    }

    #[test]
    fn overrides_replace_url_parts() -> CliResult<()> {
        let base = url(DEFAULT_URL);
        assert_eq!(compose_url(&base, None, None, None)?, base);
        assert_eq!(
            compose_url(&base, Some("https"), Some("nas:443"), None)?.as_str(),
            "https://nas/transmission/rpc/"
        );
        assert_eq!(
            compose_url(&base, None, Some("qb:8080"), Some("api/v2/"))?.as_str(),
            "http://qb:8080/api/v2/"
        );
        Ok(())
    }

    #[test]
    fn user_with_password_skips_prompt() -> CliResult<()> {
        let credentials = parse_user("admin:p:w")?;
        assert_eq!(credentials.user, "admin");
        assert_eq!(credentials.password, "p:w");
        Ok(())
    }

    #[test]
    fn selection_errors_are_validation_errors() {
        let err = CliError::from(transctl_select::SelectError::SelectionRequired);
        assert!(matches!(err, CliError::Validation(_)));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.display_message(),
            "must specify --list, --recent, --filter or at least one torrent"
        );
    }
}
