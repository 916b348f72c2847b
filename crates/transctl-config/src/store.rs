//! File-backed store implementing the shared `ConfigStore` surface.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};
use transctl_core::ConfigStore;

use crate::context::Context;
use crate::defaults::{APP_DIR, CONFIG_FILE, DEFAULT_CONFIG};
use crate::error::{ConfigError, ConfigResult};
use crate::ini::{Document, Key};

/// Resolve the config file path: the `--config` value (which already
/// folds in `TRANSCONFIG`), else the platform config directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] when no flag is given and the
/// platform has no configuration directory.
pub fn config_path(flag: Option<&Path>) -> ConfigResult<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or(ConfigError::NoConfigDir)
}

/// The local INI configuration file.
#[derive(Debug, Clone)]
pub struct LocalConfig {
    path: PathBuf,
    document: Document,
}

impl LocalConfig {
    /// Read the file, creating it with the default contents when absent.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors and malformed INI text.
    pub async fn open(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)
                        .await
                        .map_err(|source| ConfigError::io(parent, source))?;
                }
                fs::write(&path, DEFAULT_CONFIG)
                    .await
                    .map_err(|source| ConfigError::io(&path, source))?;
                info!(path = %path.display(), "created default configuration");
                DEFAULT_CONFIG.to_string()
            }
            Err(source) => return Err(ConfigError::io(path, source)),
        };
        let document = Document::parse(&text)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(Self { path, document })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed contents.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Value of a dotted key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKey`] for malformed keys.
    pub fn value(&self, key: &str) -> ConfigResult<Option<&str>> {
        Ok(self.document.get(&Key::parse(key)?))
    }

    /// Set a dotted key in memory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKey`] for malformed keys.
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        self.document.set(&Key::parse(key)?, value);
        Ok(())
    }

    /// Remove a dotted key in memory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotSet`] when the key has no value.
    pub fn unset_value(&mut self, key: &str) -> ConfigResult<()> {
        if self.document.unset(&Key::parse(key)?) {
            Ok(())
        } else {
            Err(ConfigError::NotSet {
                key: key.to_string(),
            })
        }
    }

    /// Write the document back to disk.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub async fn save(&self) -> ConfigResult<()> {
        fs::write(&self.path, self.document.to_string())
            .await
            .map_err(|source| ConfigError::io(&self.path, source))?;
        debug!(path = %self.path.display(), "saved configuration");
        Ok(())
    }

    /// Resolve the active context from the `--context` value (which already
    /// folds in `TRANSCONTEXT`) or `default.context`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownContext`] when the named context has no
    /// section.
    pub fn context(&self, flag: Option<&str>) -> ConfigResult<Context<'_>> {
        Context::resolve(&self.document, flag)
    }
}

#[async_trait]
impl ConfigStore for LocalConfig {
    async fn keys(&mut self) -> anyhow::Result<Vec<(String, String)>> {
        Ok(self.document.entries())
    }

    async fn get(&mut self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.value(key)?.map(str::to_string))
    }

    async fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        Ok(self.set_value(key, value)?)
    }

    async fn unset(&mut self, key: &str) -> anyhow::Result<()> {
        Ok(self.unset_value(key)?)
    }

    async fn write(&mut self) -> anyhow::Result<()> {
        Ok(self.save().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() -> ConfigResult<()> {
        let path = config_path(Some(Path::new("/tmp/custom.ini")))?;
        assert_eq!(path, PathBuf::from("/tmp/custom.ini"));
        Ok(())
    }

    #[tokio::test]
    async fn unset_of_missing_key_fails() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = LocalConfig::open(dir.path().join("config.ini")).await?;
        let err = config.unset_value("default.sort-by").expect_err("not set");
        assert_eq!(err.to_string(), "default.sort-by is not set");
        Ok(())
    }
}
