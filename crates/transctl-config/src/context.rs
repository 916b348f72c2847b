//! Active-context lookup.
//!
//! A setting resolves from the command-line value (clap has already folded
//! in the environment), then `[context "<active>"]`, then `[default]`.

use std::collections::BTreeMap;
use std::time::Duration;

use transctl_core::{DEFAULT_RETRIES, DEFAULT_TIMEOUT};
use url::Url;

use crate::defaults::{CONTEXT_KEY, CONTEXT_SECTION, DEFAULT_SECTION};
use crate::error::{ConfigError, ConfigResult};
use crate::ini::{Document, Key};

/// The active context over a loaded document.
#[derive(Debug, Clone)]
pub struct Context<'a> {
    document: &'a Document,
    name: Option<String>,
}

impl<'a> Context<'a> {
    pub(crate) fn resolve(document: &'a Document, flag: Option<&str>) -> ConfigResult<Self> {
        let name = flag.map(str::to_string).or_else(|| {
            document
                .get(&Key::new(DEFAULT_SECTION, None, CONTEXT_KEY))
                .map(str::to_string)
        });
        if let Some(name) = &name
            && !document.has_section(CONTEXT_SECTION, Some(name))
        {
            return Err(ConfigError::UnknownContext { name: name.clone() });
        }
        Ok(Self { document, name })
    }

    /// Name of the active context, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Context section value, falling back to `[default]`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&'a str> {
        self.name
            .as_deref()
            .and_then(|name| {
                self.document
                    .get(&Key::new(CONTEXT_SECTION, Some(name), key))
            })
            .or_else(|| self.document.get(&Key::new(DEFAULT_SECTION, None, key)))
    }

    /// `flag`, else [`Context::lookup`].
    #[must_use]
    pub fn resolve_value(&self, flag: Option<&str>, key: &str) -> Option<String> {
        flag.or_else(|| self.lookup(key)).map(str::to_string)
    }

    /// Daemon URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparsable URLs.
    pub fn url(&self, flag: Option<&str>) -> ConfigResult<Option<Url>> {
        self.resolve_value(flag, "url")
            .map(|raw| Url::parse(&raw).map_err(|err| ConfigError::invalid("url", &raw, err.to_string())))
            .transpose()
    }

    /// Per-request timeout; bare numbers are seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for malformed durations.
    pub fn timeout(&self, flag: Option<&str>) -> ConfigResult<Duration> {
        self.resolve_value(flag, "timeout")
            .map_or(Ok(DEFAULT_TIMEOUT), |raw| parse_duration("timeout", &raw))
    }

    /// Handshake retry bound.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the value is not a count.
    pub fn retries(&self) -> ConfigResult<u32> {
        self.lookup("retries").map_or(Ok(DEFAULT_RETRIES), |raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::invalid("retries", raw, "expected a non-negative count"))
        })
    }

    /// Comma-separated list, empty when unset.
    #[must_use]
    pub fn list(&self, key: &str) -> Vec<String> {
        self.lookup(key).map(split_list).unwrap_or_default()
    }

    /// Column renames as `wire -> display`, from `wire=Display,...`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for pairs without `=`.
    pub fn renames(&self, flag: Option<&str>) -> ConfigResult<BTreeMap<String, String>> {
        let Some(raw) = self.resolve_value(flag, "column-name") else {
            return Ok(BTreeMap::new());
        };
        split_list(&raw)
            .into_iter()
            .map(|pair| {
                pair.split_once('=')
                    .map(|(wire, display)| (wire.trim().to_string(), display.trim().to_string()))
                    .filter(|(wire, display)| !wire.is_empty() && !display.is_empty())
                    .ok_or_else(|| ConfigError::invalid("column-name", &pair, "expected wire=Display"))
            })
            .collect()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `25`, `25s`, `500ms`, `2m` or `1h`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for anything else.
pub fn parse_duration(key: &str, raw: &str) -> ConfigResult<Duration> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    let amount: u64 = digits
        .parse()
        .map_err(|_| ConfigError::invalid(key, raw, "expected a whole number with an optional ms/s/m/h suffix"))?;
    let duration = match unit.trim() {
        "" | "s" => Duration::from_secs(amount),
        "ms" => Duration::from_millis(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        "h" => Duration::from_secs(amount.saturating_mul(3600)),
        other => return Err(ConfigError::invalid(key, raw, format!("unknown unit {other:?}"))),
    };
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "[default]\n\toutput = table\n\ttimeout = 10\n\tcontext = nas\n\
[context \"nas\"]\n\turl = http://nas:9091/transmission/rpc/\n\ttimeout = 2m\n\tfree-space = /data, /backup\n\
[context \"qb\"]\n\turl = http://qb:8080/api/v2/\n\tcolumn-name = haveValid=HAVE,name=Title\n";

    fn document() -> Document {
        Document::parse(TEXT).expect("valid document")
    }

    #[test]
    fn flag_then_context_then_default() -> ConfigResult<()> {
        let document = document();
        let context = Context::resolve(&document, None)?;
        assert_eq!(context.name(), Some("nas"));
        assert_eq!(context.timeout(None)?, Duration::from_secs(120));
        assert_eq!(context.timeout(Some("5s"))?, Duration::from_secs(5));
        assert_eq!(context.lookup("output"), Some("table"));
        assert_eq!(context.list("free-space"), vec!["/data", "/backup"]);

        let other = Context::resolve(&document, Some("qb"))?;
        assert_eq!(other.timeout(None)?, Duration::from_secs(10));
        assert_eq!(
            other.url(None)?.map(String::from),
            Some("http://qb:8080/api/v2/".to_string())
        );
        Ok(())
    }

    #[test]
    fn unknown_context_is_an_error() {
        let document = document();
        let err = Context::resolve(&document, Some("missing")).expect_err("no such context");
        assert!(matches!(err, ConfigError::UnknownContext { name } if name == "missing"));
    }

    #[test]
    fn renames_and_defaults() -> ConfigResult<()> {
        let document = document();
        let context = Context::resolve(&document, Some("qb"))?;
        let renames = context.renames(None)?;
        assert_eq!(renames.get("haveValid").map(String::as_str), Some("HAVE"));
        assert_eq!(renames.len(), 2);
        assert!(context.renames(Some("broken")).is_err());
        assert_eq!(context.retries()?, DEFAULT_RETRIES);
        Ok(())
    }

    #[test]
    fn durations_accept_units() -> ConfigResult<()> {
        assert_eq!(parse_duration("timeout", "25")?, Duration::from_secs(25));
        assert_eq!(parse_duration("timeout", "500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("timeout", "1h")?, Duration::from_secs(3600));
        assert!(parse_duration("timeout", "soon").is_err());
        assert!(parse_duration("timeout", "3d").is_err());
        Ok(())
    }
}
