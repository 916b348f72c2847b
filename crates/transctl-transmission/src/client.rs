//! JSON-RPC transport: envelope, session-id handshake, and credential fallback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use transctl_core::{Credentials, ProviderError, ProviderResult, SessionConfig};
use url::Url;

/// Header carrying the CSRF token.
pub const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// Endpoint used when the context names none.
pub const DEFAULT_URL: &str = "http://localhost:9091/transmission/rpc/";

#[derive(Serialize)]
struct Envelope<'a, A> {
    method: &'a str,
    arguments: &'a A,
    tag: u64,
}

#[derive(Deserialize)]
struct Reply {
    result: String,
    #[serde(default)]
    arguments: Value,
    #[serde(default)]
    tag: Option<u64>,
}

/// Arguments object for methods that take none.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoArguments {}

struct Inner {
    http: Client,
    url: Url,
    fallback: Option<Credentials>,
    inject: AtomicBool,
    token: RwLock<Option<String>>,
    tag: AtomicU64,
    retries: u32,
}

/// Cloneable handle to one Transmission RPC session.
#[derive(Clone)]
pub struct TransmissionClient {
    inner: Arc<Inner>,
}

impl TransmissionClient {
    /// Build a client for the configured endpoint.
    ///
    /// When no fallback credentials are configured and the host is
    /// `localhost`, the daemon's stock `transmission:transmission` pair is
    /// used on the first 401.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &SessionConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ProviderError::transport("client setup", err))?;
        let fallback = config.credentials.clone().or_else(|| {
            (config.url.host_str() == Some("localhost"))
                .then(|| Credentials::new("transmission", "transmission"))
        });
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                url: config.url.clone(),
                fallback,
                inject: AtomicBool::new(false),
                token: RwLock::new(None),
                tag: AtomicU64::new(0),
                retries: config.retries.max(1),
            }),
        })
    }

    /// Endpoint this client posts to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Most recently observed session id.
    pub async fn session_id(&self) -> Option<String> {
        self.inner.token.read().await.clone()
    }

    fn next_tag(&self) -> u64 {
        self.inner.tag.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn target(&self) -> Url {
        let mut url = self.inner.url.clone();
        if self.inner.inject.load(Ordering::Acquire)
            && let Some(credentials) = &self.inner.fallback
        {
            // reqwest lifts userinfo into an Authorization header.
            let _ = url.set_username(&credentials.user);
            let _ = url.set_password(Some(&credentials.password));
        }
        url
    }

    async fn remember_token(&self, headers: &HeaderMap) -> bool {
        let Some(token) = headers
            .get(SESSION_ID_HEADER)
            .and_then(|value| value.to_str().ok())
        else {
            return false;
        };
        *self.inner.token.write().await = Some(token.to_string());
        true
    }

    /// Invoke `method` and decode its `arguments` object.
    ///
    /// # Errors
    ///
    /// Fails with [`ProviderError::RequestFailed`] when the daemon reports a
    /// result other than `success`, [`ProviderError::Unauthorized`] when
    /// credentials are rejected, and [`ProviderError::RetriesExhausted`]
    /// when the handshake does not converge.
    pub async fn call<A, R>(&self, method: &'static str, arguments: &A) -> ProviderResult<R>
    where
        A: Serialize + Sync,
        R: DeserializeOwned,
    {
        let tag = self.next_tag();
        let envelope = Envelope {
            method,
            arguments,
            tag,
        };
        let body =
            serde_json::to_vec(&envelope).map_err(|err| ProviderError::decode(method, err))?;

        for attempt in 1..=self.inner.retries {
            let mut request = self
                .inner
                .http
                .post(self.target())
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.clone());
            if let Some(token) = self.inner.token.read().await.as_deref() {
                request = request.header(SESSION_ID_HEADER, token);
            }
            debug!(method, tag, attempt, "transmission request");

            let response = request
                .send()
                .await
                .map_err(|err| ProviderError::transport(method, err))?;
            match response.status() {
                StatusCode::CONFLICT => {
                    if !self.remember_token(response.headers()).await {
                        return Err(ProviderError::UnexpectedStatus { status: 409 });
                    }
                    debug!(method, tag, "session id refreshed");
                }
                StatusCode::UNAUTHORIZED => {
                    if self.inner.fallback.is_none() || self.inner.inject.swap(true, Ordering::AcqRel)
                    {
                        return Err(ProviderError::Unauthorized);
                    }
                    debug!(method, tag, "retrying with fallback credentials");
                }
                status if status.is_success() => {
                    self.remember_token(response.headers()).await;
                    let bytes = response
                        .bytes()
                        .await
                        .map_err(|err| ProviderError::transport(method, err))?;
                    return decode_reply(method, tag, &bytes);
                }
                status => {
                    return Err(ProviderError::UnexpectedStatus {
                        status: status.as_u16(),
                    });
                }
            }
        }
        Err(ProviderError::RetriesExhausted {
            attempts: self.inner.retries,
        })
    }
}

fn decode_reply<R: DeserializeOwned>(method: &'static str, tag: u64, bytes: &[u8]) -> ProviderResult<R> {
    let reply: Reply =
        serde_json::from_slice(bytes).map_err(|err| ProviderError::decode(method, err))?;
    if reply.tag.is_some_and(|echoed| echoed != tag) {
        debug!(method, tag, echoed = ?reply.tag, "reply tag mismatch");
    }
    if reply.result != "success" {
        return Err(ProviderError::RequestFailed {
            result: reply.result,
        });
    }
    let arguments = if reply.arguments.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        reply.arguments
    };
    serde_json::from_value(arguments).map_err(|err| ProviderError::decode(method, err))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer, credentials: Option<Credentials>) -> TransmissionClient {
        let url = Url::parse(&server.url("/transmission/rpc/")).expect("mock url");
        TransmissionClient::new(&SessionConfig::new(url).with_credentials(credentials))
            .expect("client builds")
    }

    #[tokio::test]
    async fn session_id_is_captured_and_replayed() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let conflict = server.mock(|when, then| {
            when.method(POST)
                .path("/transmission/rpc/")
                .header_missing(SESSION_ID_HEADER);
            then.status(409).header(SESSION_ID_HEADER, "t1");
        });
        let accepted = server.mock(|when, then| {
            when.method(POST)
                .path("/transmission/rpc/")
                .header(SESSION_ID_HEADER, "t1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"result": "success", "arguments": {"torrents": []}}));
        });

        let client = client_for(&server, None);
        let first: Value = client.call("torrent-get", &json!({"fields": ["id"]})).await?;
        assert_eq!(first, json!({"torrents": []}));
        let _: Value = client.call("torrent-get", &json!({"fields": ["id"]})).await?;

        conflict.assert_calls(1);
        accepted.assert_calls(2);
        assert_eq!(client.session_id().await.as_deref(), Some("t1"));
        Ok(())
    }

    #[tokio::test]
    async fn failed_result_is_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/transmission/rpc/");
            then.status(200)
                .json_body(json!({"result": "duplicate torrent", "arguments": {}}));
        });

        let client = client_for(&server, None);
        let err = client
            .call::<_, Value>("torrent-add", &NoArguments {})
            .await
            .expect_err("result is not success");
        assert!(matches!(err, ProviderError::RequestFailed { ref result } if result == "duplicate torrent"));
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn unauthorised_without_fallback_fails() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/transmission/rpc/");
            then.status(401);
        });

        let client = client_for(&server, None);
        let err = client
            .call::<_, Value>("session-get", &NoArguments {})
            .await
            .expect_err("401 without fallback");
        assert!(matches!(err, ProviderError::Unauthorized));
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn fallback_credentials_are_injected_after_401() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let challenge = server.mock(|when, then| {
            when.method(POST)
                .path("/transmission/rpc/")
                .header_missing("authorization");
            then.status(401);
        });
        let authorised = server.mock(|when, then| {
            when.method(POST)
                .path("/transmission/rpc/")
                .header("authorization", "Basic dXNlcjpwYXNz");
            then.status(200)
                .json_body(json!({"result": "success", "arguments": {"port-is-open": true}}));
        });

        let client = client_for(&server, Some(Credentials::new("user", "pass")));
        let reply: Value = client.call("port-test", &NoArguments {}).await?;
        assert_eq!(reply, json!({"port-is-open": true}));
        challenge.assert_calls(1);
        authorised.assert_calls(1);
        Ok(())
    }

    #[tokio::test]
    async fn endless_conflicts_exhaust_retries() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/transmission/rpc/");
            then.status(409).header(SESSION_ID_HEADER, "rotating");
        });

        let url = Url::parse(&server.url("/transmission/rpc/")).expect("mock url");
        let client =
            TransmissionClient::new(&SessionConfig::new(url).with_retries(3)).expect("client");
        let err = client
            .call::<_, Value>("torrent-get", &NoArguments {})
            .await
            .expect_err("never converges");
        assert!(matches!(err, ProviderError::RetriesExhausted { attempts: 3 }));
        mock.assert_calls(3);
    }

    #[test]
    fn localhost_gets_stock_credentials() -> Result<(), url::ParseError> {
        let client = TransmissionClient::new(&SessionConfig::new(Url::parse(DEFAULT_URL)?))
            .expect("client");
        assert_eq!(
            client.inner.fallback,
            Some(Credentials::new("transmission", "transmission"))
        );
        assert_eq!(client.next_tag(), 1);
        assert_eq!(client.next_tag(), 2);
        Ok(())
    }
}
