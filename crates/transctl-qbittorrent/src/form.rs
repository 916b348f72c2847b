//! Form encoding helpers for WebUI requests.
//!
//! Request structs derive `Serialize`; list fields pick one of the join
//! helpers below through `serialize_with`, and `Option` fields carry
//! `skip_serializing_if` so unset values never reach the daemon.

use reqwest::multipart::{Form, Part};
use serde::{Serialize, Serializer};
use serde_json::Value;
use transctl_core::{ProviderError, ProviderResult, TorrentIds};

/// A form-encoded WebUI endpoint.
pub trait Endpoint: Serialize + Send + Sync {
    /// Path below `api/v2/`.
    fn path(&self) -> &'static str;

    /// Multipart body, for endpoints that upload files.
    ///
    /// # Errors
    ///
    /// Returns an error when a part cannot be built.
    fn multipart(&self) -> ProviderResult<Option<Form>> {
        Ok(None)
    }
}

/// Join with `|` (torrent hashes, file ids, tracker URLs to remove).
///
/// # Errors
///
/// Propagates serializer failures.
pub fn pipe<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&items.join("|"))
}

/// Join with `,` (tags, categories).
///
/// # Errors
///
/// Propagates serializer failures.
pub fn comma<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&items.join(","))
}

/// Join with newlines (URLs to add, tracker URLs).
///
/// # Errors
///
/// Propagates serializer failures.
pub fn newline<S: Serializer>(items: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&items.join("\n"))
}

/// Hash list for `ids`; `All` becomes the daemon's `all` keyword.
///
/// # Errors
///
/// Fails for [`TorrentIds::RecentlyActive`] and for numeric ids, which the
/// WebUI does not understand.
pub fn hashes(ids: &TorrentIds) -> ProviderResult<Vec<String>> {
    match ids {
        TorrentIds::All => Ok(vec!["all".to_string()]),
        TorrentIds::RecentlyActive => Err(ProviderError::Unsupported {
            operation: "recently-active addressing",
        }),
        TorrentIds::List(list) => list
            .iter()
            .map(|id| {
                id.as_hash()
                    .map(str::to_string)
                    .ok_or(ProviderError::Unsupported {
                        operation: "numeric torrent ids",
                    })
            })
            .collect(),
    }
}

/// Build a multipart body from the scalar fields of `request` plus files.
///
/// # Errors
///
/// Returns an error if `request` does not serialize to an object.
pub fn multipart_from<T: Serialize>(
    request: &T,
    files: impl IntoIterator<Item = (String, Vec<u8>)>,
) -> ProviderResult<Form> {
    let Value::Object(fields) =
        serde_json::to_value(request).map_err(|err| ProviderError::decode("torrents/add", err))?
    else {
        return Err(ProviderError::InvalidValue {
            key: "torrents/add".to_string(),
            value: String::new(),
            reason: "request does not encode as an object".to_string(),
        });
    };
    let mut form = Form::new();
    for (key, value) in fields {
        let text = match value {
            Value::String(text) => text,
            Value::Null => continue,
            other => other.to_string(),
        };
        form = form.text(key, text);
    }
    for (name, bytes) in files {
        let part = Part::bytes(bytes)
            .file_name(name)
            .mime_str("application/x-bittorrent")
            .map_err(|err| ProviderError::transport("torrents/add", err))?;
        form = form.part("torrents", part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use transctl_core::TorrentId;

    use super::*;

    #[derive(Serialize)]
    struct Sample {
        #[serde(serialize_with = "pipe")]
        hashes: Vec<String>,
        #[serde(serialize_with = "comma")]
        tags: Vec<String>,
        #[serde(serialize_with = "newline")]
        urls: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<String>,
    }

    #[test]
    fn lists_join_with_daemon_separators() -> Result<(), serde_json::Error> {
        let sample = Sample {
            hashes: vec!["a".into(), "b".into()],
            tags: vec!["x".into(), "y".into()],
            urls: vec!["u1".into(), "u2".into()],
            category: None,
        };
        assert_eq!(
            serde_json::to_value(&sample)?,
            json!({"hashes": "a|b", "tags": "x,y", "urls": "u1\nu2"})
        );
        Ok(())
    }

    #[test]
    fn all_maps_to_keyword_and_ids_are_rejected() {
        assert_eq!(hashes(&TorrentIds::All).ok(), Some(vec!["all".to_string()]));
        assert!(hashes(&TorrentIds::List(vec![TorrentId::Id(1)])).is_err());
        assert!(hashes(&TorrentIds::RecentlyActive).is_err());
    }
}
