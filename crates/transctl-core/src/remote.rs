//! Key/value configuration façade shared by the local file and the daemons.
//!
//! # Design
//! - [`ConfigStore`] is the surface the `config` verb drives; the local INI
//!   store and [`RemoteConfig`] both implement it.
//! - [`RemoteConfig`] reads the daemon settings once, flattens them into
//!   dotted keys, and buffers writes until [`ConfigStore::write`] flushes
//!   them through the [`ConfigBackend`] in a single call.
//! - [`coerce`] converts a raw string into the JSON type of the existing
//!   value so the daemon never sees a string where it expects a number.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Number, Value};

use crate::error::{ProviderError, ProviderResult};

/// Flat key/value configuration with buffered writes.
#[async_trait]
pub trait ConfigStore: Send {
    /// Every key with its current value, sorted by key.
    async fn keys(&mut self) -> anyhow::Result<Vec<(String, String)>>;

    /// Value of one key, `None` when unset.
    async fn get(&mut self, key: &str) -> anyhow::Result<Option<String>>;

    /// Stage a new value.
    async fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Stage removal of a key.
    async fn unset(&mut self, key: &str) -> anyhow::Result<()>;

    /// Persist staged changes.
    async fn write(&mut self) -> anyhow::Result<()>;
}

/// Daemon-side load/store of the settings object.
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// Fetch the current settings object.
    async fn load(&self) -> ProviderResult<Map<String, Value>>;

    /// Submit only the changed settings.
    async fn store(&self, changes: Map<String, Value>) -> ProviderResult<()>;
}

/// Read-modify-write store over a [`ConfigBackend`].
pub struct RemoteConfig<B> {
    backend: B,
    snapshot: Option<BTreeMap<String, Value>>,
    pending: BTreeMap<String, Value>,
}

impl<B: ConfigBackend> RemoteConfig<B> {
    /// Wrap a backend; nothing is fetched until first use.
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            snapshot: None,
            pending: BTreeMap::new(),
        }
    }

    async fn snapshot(&mut self) -> ProviderResult<&BTreeMap<String, Value>> {
        if self.snapshot.is_none() {
            let loaded = self.backend.load().await?;
            self.snapshot = Some(flatten(&loaded));
        }
        Ok(self.snapshot.get_or_insert_with(BTreeMap::new))
    }

    fn current(&self, key: &str) -> Option<&Value> {
        self.pending
            .get(key)
            .or_else(|| self.snapshot.as_ref().and_then(|snapshot| snapshot.get(key)))
    }
}

#[async_trait]
impl<B: ConfigBackend> ConfigStore for RemoteConfig<B> {
    async fn keys(&mut self) -> anyhow::Result<Vec<(String, String)>> {
        let keys: Vec<String> = self.snapshot().await?.keys().cloned().collect();
        Ok(keys
            .into_iter()
            .map(|key| {
                let value = self.current(&key).map(display_value).unwrap_or_default();
                (key, value)
            })
            .collect())
    }

    async fn get(&mut self, key: &str) -> anyhow::Result<Option<String>> {
        self.snapshot().await?;
        Ok(self.current(key).map(display_value))
    }

    async fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let template = self
            .snapshot()
            .await?
            .get(key)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownKey {
                key: key.to_string(),
            })?;
        let coerced = coerce(key, &template, value)?;
        self.pending.insert(key.to_string(), coerced);
        Ok(())
    }

    async fn unset(&mut self, key: &str) -> anyhow::Result<()> {
        if self.pending.remove(key).is_some() {
            return Ok(());
        }
        Err(ProviderError::Unsupported {
            operation: "unset of remote keys",
        }
        .into())
    }

    async fn write(&mut self) -> anyhow::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let changes = unflatten(std::mem::take(&mut self.pending));
        self.backend.store(changes).await?;
        self.snapshot = None;
        Ok(())
    }
}

/// Flatten nested objects into dotted keys.
#[must_use]
pub fn flatten(object: &Map<String, Value>) -> BTreeMap<String, Value> {
    let mut flat = BTreeMap::new();
    flatten_into(&mut flat, "", object);
    flat
}

fn flatten_into(flat: &mut BTreeMap<String, Value>, prefix: &str, object: &Map<String, Value>) {
    for (key, value) in object {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten_into(flat, &path, inner),
            other => {
                flat.insert(path, other.clone());
            }
        }
    }
}

fn unflatten(flat: BTreeMap<String, Value>) -> Map<String, Value> {
    let mut root = Map::new();
    for (key, value) in flat {
        let parts: Vec<&str> = key.split('.').collect();
        insert_path(&mut root, &parts, value);
    }
    root
}

fn insert_path(node: &mut Map<String, Value>, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [leaf] => {
            node.insert((*leaf).to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = node
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                insert_path(inner, rest, value);
            }
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// Encode a float as a JSON number, using the integer form when it is whole.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "whole values inside the i64 range convert exactly"
)]
pub fn json_number(value: f64) -> Value {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < LIMIT {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

/// Convert `raw` into the JSON type of `template`.
///
/// Supported destination types are string, integer, float, boolean, and
/// lists of strings or integers (comma-separated input).
///
/// # Errors
///
/// Returns [`ProviderError::InvalidValue`] when `raw` does not parse as the
/// destination type or the destination is a nested section.
pub fn coerce(key: &str, template: &Value, raw: &str) -> ProviderResult<Value> {
    let invalid = |reason: String| ProviderError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason,
    };
    match template {
        Value::String(_) | Value::Null => Ok(Value::String(raw.to_string())),
        Value::Bool(_) => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| invalid("expected a boolean".to_string())),
        Value::Number(number) if number.is_f64() => raw
            .trim()
            .parse::<f64>()
            .map(json_number)
            .map_err(|err| invalid(err.to_string())),
        Value::Number(_) => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|err| invalid(err.to_string())),
        Value::Array(items) => {
            let integers = items.first().is_some_and(Value::is_number);
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| {
                    if integers {
                        item.parse::<i64>()
                            .map(Value::from)
                            .map_err(|err| invalid(err.to_string()))
                    } else {
                        Ok(Value::String(item.to_string()))
                    }
                })
                .collect::<ProviderResult<Vec<_>>>()
                .map(Value::Array)
        }
        Value::Object(_) => Err(invalid("key names a section, not a value".to_string())),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder {
        stored: Arc<Mutex<Vec<Map<String, Value>>>>,
    }

    #[async_trait]
    impl ConfigBackend for Recorder {
        async fn load(&self) -> ProviderResult<Map<String, Value>> {
            let Value::Object(map) = json!({
                "download-dir": "/data",
                "peer-port": 51413,
                "seedRatioLimit": 2.5,
                "utp-enabled": true,
                "units": {"speed-units": ["kB/s", "MB/s"]},
            }) else {
                unreachable!("literal is an object");
            };
            Ok(map)
        }

        async fn store(&self, changes: Map<String, Value>) -> ProviderResult<()> {
            self.stored.lock().expect("lock").push(changes);
            Ok(())
        }
    }

    #[test]
    fn coerce_follows_template_type() {
        assert_eq!(coerce("k", &json!(1), "42").ok(), Some(json!(42)));
        assert_eq!(coerce("k", &json!(1.5), "2").ok(), Some(json!(2)));
        assert_eq!(coerce("k", &json!(1.5), "2.25").ok(), Some(json!(2.25)));
        assert_eq!(coerce("k", &json!(false), "yes").ok(), Some(json!(true)));
        assert_eq!(coerce("k", &json!(["a"]), "x, y").ok(), Some(json!(["x", "y"])));
        assert_eq!(coerce("k", &json!([1]), "3,4").ok(), Some(json!([3, 4])));
        assert!(matches!(
            coerce("peer-port", &json!(1), "abc"),
            Err(ProviderError::InvalidValue { .. })
        ));
    }

    #[test]
    fn json_number_drops_trailing_zero() {
        assert_eq!(json_number(2.0).to_string(), "2");
        assert_eq!(json_number(0.5).to_string(), "0.5");
    }

    #[tokio::test]
    async fn remote_config_flushes_only_changes() -> anyhow::Result<()> {
        let backend = Recorder::default();
        let mut store = RemoteConfig::new(backend.clone());
        assert_eq!(
            store.get("units.speed-units").await?.as_deref(),
            Some("kB/s,MB/s")
        );
        store.set("peer-port", "6881").await?;
        store.set("units.speed-units", "KB/s").await?;
        assert_eq!(store.get("peer-port").await?.as_deref(), Some("6881"));
        assert!(store.set("no-such-key", "1").await.is_err());
        store.write().await?;

        let stored = backend.stored.lock().expect("lock").clone();
        assert_eq!(stored.len(), 1);
        assert_eq!(
            Value::Object(stored[0].clone()),
            json!({"peer-port": 6881, "units": {"speed-units": ["KB/s"]}})
        );
        Ok(())
    }
}
