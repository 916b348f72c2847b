//! `.netrc` credential lookup.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use transctl_core::Credentials;

use crate::error::{ConfigError, ConfigResult};

/// Login entry for one machine (or the `default` entry).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Machine {
    /// `login` token.
    pub login: Option<String>,
    /// `password` token.
    pub password: Option<String>,
    /// `account` token.
    pub account: Option<String>,
}

impl Machine {
    /// Credentials when a login is present; a missing password is empty.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.login.as_ref().map(|login| {
            Credentials::new(login.clone(), self.password.clone().unwrap_or_default())
        })
    }
}

/// Parsed netrc file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Netrc {
    machines: Vec<(String, Machine)>,
    default: Option<Machine>,
}

enum Target {
    Host(String),
    Default,
}

impl Netrc {
    /// Platform location: `~/.netrc`, or `~/_netrc` on Windows.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        let name = if cfg!(windows) { "_netrc" } else { ".netrc" };
        dirs::home_dir().map(|home| home.join(name))
    }

    /// Read and parse a netrc file; a missing file yields `None`.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors other than absence, and on malformed contents.
    pub async fn load(path: &Path) -> ConfigResult<Option<Self>> {
        match fs::read_to_string(path).await {
            Ok(text) => {
                debug!(path = %path.display(), "parsing netrc");
                Self::parse(&text).map(Some)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::io(path, source)),
        }
    }

    /// Parse netrc text. `macdef` bodies run to the next blank line and are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Netrc`] for unknown tokens, tokens missing
    /// their value, and credentials outside a `machine`/`default` entry.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        let mut netrc = Self::default();
        let mut current: Option<(Target, Machine)> = None;
        let mut in_macro = false;

        for (index, line) in text.lines().enumerate() {
            let number = index + 1;
            if in_macro {
                in_macro = !line.trim().is_empty();
                continue;
            }
            let mut tokens = line.split_whitespace();
            while let Some(token) = tokens.next() {
                let mut value = || {
                    tokens.next().map(str::to_string).ok_or_else(|| ConfigError::Netrc {
                        line: number,
                        message: format!("{token} requires a value"),
                    })
                };
                match token {
                    "machine" => {
                        let host = value()?;
                        netrc.finish(current.replace((Target::Host(host), Machine::default())));
                    }
                    "default" => {
                        netrc.finish(current.replace((Target::Default, Machine::default())));
                    }
                    "login" | "password" | "account" => {
                        let value = value()?;
                        let Some((_, machine)) = current.as_mut() else {
                            return Err(ConfigError::Netrc {
                                line: number,
                                message: format!("{token} outside of a machine entry"),
                            });
                        };
                        let slot = match token {
                            "login" => &mut machine.login,
                            "password" => &mut machine.password,
                            _ => &mut machine.account,
                        };
                        *slot = Some(value);
                    }
                    "macdef" => {
                        value()?;
                        in_macro = true;
                        break;
                    }
                    comment if comment.starts_with('#') => break,
                    other => {
                        return Err(ConfigError::Netrc {
                            line: number,
                            message: format!("unexpected token {other:?}"),
                        });
                    }
                }
            }
        }
        netrc.finish(current);
        Ok(netrc)
    }

    fn finish(&mut self, entry: Option<(Target, Machine)>) {
        match entry {
            Some((Target::Host(host), machine)) => self.machines.push((host, machine)),
            Some((Target::Default, machine)) => self.default = Some(machine),
            None => {}
        }
    }

    /// Entry for `host`, falling back to `default`.
    #[must_use]
    pub fn machine(&self, host: &str) -> Option<&Machine> {
        self.machines
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(host))
            .map(|(_, machine)| machine)
            .or(self.default.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# home daemons
machine nas login admin password s3cret
machine qb
    login alice
    password hunter2
macdef init
cd /pub
bin

default login anonymous password guest
";

    #[test]
    fn machines_and_default() -> ConfigResult<()> {
        let netrc = Netrc::parse(SAMPLE)?;
        let nas = netrc.machine("NAS").and_then(Machine::credentials).expect("nas entry");
        assert_eq!((nas.user.as_str(), nas.password.as_str()), ("admin", "s3cret"));
        let qb = netrc.machine("qb").expect("qb entry");
        assert_eq!(qb.login.as_deref(), Some("alice"));
        assert_eq!(qb.password.as_deref(), Some("hunter2"));
        let other = netrc.machine("elsewhere").expect("default entry");
        assert_eq!(other.login.as_deref(), Some("anonymous"));
        Ok(())
    }

    #[test]
    fn malformed_entries_are_rejected() {
        for (text, line) in [
            ("login bob", 1),
            ("machine a\n  password", 2),
            ("machine a port 22", 1),
        ] {
            match Netrc::parse(text) {
                Err(ConfigError::Netrc { line: found, .. }) => assert_eq!(found, line, "{text}"),
                other => panic!("expected netrc error for {text:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_file_has_no_entries() -> ConfigResult<()> {
        assert!(Netrc::parse("")?.machine("anything").is_none());
        Ok(())
    }
}
