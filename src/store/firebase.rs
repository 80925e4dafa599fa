//! Firebase Realtime Database client for the shared awning record
//!
//! Talks REST for writes and a `text/event-stream` request for the change
//! subscription. Authentication is email/password via the Identity Toolkit
//! endpoint; the session token is cached and refreshed with a safety margin
//! so `ensure_signed_in` is a cheap no-op on the hot path.

use crate::config::{CredentialsConfig, StoreConfig};
use crate::error::{Result, VelariumError};
use crate::logging::{StructuredLogger, get_logger};
use crate::store::RemoteStore;
use crate::store::sse::{SseParser, apply_patch, apply_put};
use chrono::{DateTime, Utc};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tokio_stream::StreamExt;

const AUTH_ENDPOINT: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";

/// Refresh the session this long before the token actually expires
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct SessionToken {
    id_token: String,
    expires_at: DateTime<Utc>,
}

impl SessionToken {
    fn is_valid(&self) -> bool {
        Utc::now() + chrono::Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    #[serde(rename = "idToken")]
    id_token: String,
    #[serde(rename = "expiresIn")]
    expires_in: String,
}

/// Production [`RemoteStore`] backed by a Firebase Realtime Database
pub struct FirebaseStore {
    http: reqwest::Client,
    store: StoreConfig,
    credentials: CredentialsConfig,
    token: Mutex<Option<SessionToken>>,
    logger: StructuredLogger,
}

impl FirebaseStore {
    /// Create a new store client
    pub fn new(store: &StoreConfig, credentials: &CredentialsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            store: store.clone(),
            credentials: credentials.clone(),
            token: Mutex::new(None),
            logger: get_logger("store"),
        })
    }

    /// Return a valid session token, signing in if needed
    async fn current_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref()
            && token.is_valid()
        {
            return Ok(token.id_token.clone());
        }

        let token = sign_in(&self.http, &self.store.api_key, &self.credentials).await?;
        let id_token = token.id_token.clone();
        *guard = Some(token);
        self.logger.info("Established store session");
        Ok(id_token)
    }

    fn record_url(&self, key: Option<&str>, token: &str) -> String {
        let base = self.store.database_url.trim_end_matches('/');
        match key {
            Some(key) => format!(
                "{}/{}/{}.json?auth={}",
                base, self.store.record_path, key, token
            ),
            None => format!("{}/{}.json?auth={}", base, self.store.record_path, token),
        }
    }
}

async fn sign_in(
    http: &reqwest::Client,
    api_key: &str,
    credentials: &CredentialsConfig,
) -> Result<SessionToken> {
    let url = format!("{}?key={}", AUTH_ENDPOINT, api_key);
    let response = http
        .post(&url)
        .json(&serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
            "returnSecureToken": true,
        }))
        .send()
        .await
        .map_err(|e| VelariumError::auth(format!("Sign-in request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(VelariumError::auth(format!(
            "Sign-in rejected: {}",
            response.status()
        )));
    }

    let body: SignInResponse = response
        .json()
        .await
        .map_err(|e| VelariumError::auth(format!("Malformed sign-in response: {}", e)))?;
    let lifetime_secs = body.expires_in.parse::<i64>().unwrap_or(3600);

    Ok(SessionToken {
        id_token: body.id_token,
        expires_at: Utc::now() + chrono::Duration::seconds(lifetime_secs),
    })
}

#[async_trait::async_trait]
impl RemoteStore for FirebaseStore {
    async fn ensure_signed_in(&self) -> Result<()> {
        self.current_token().await.map(|_| ())
    }

    async fn write(&self, key: &str, value: Value) -> Result<()> {
        let token = self.current_token().await?;
        let url = self.record_url(Some(key), &token);
        let response = self.http.put(&url).json(&value).send().await?;
        if !response.status().is_success() {
            return Err(VelariumError::store(format!(
                "Write to '{}' rejected: {}",
                key,
                response.status()
            )));
        }
        self.logger.debug(&format!("Wrote field '{}'", key));
        Ok(())
    }

    async fn update(&self, fields: serde_json::Map<String, Value>) -> Result<()> {
        let token = self.current_token().await?;
        let url = self.record_url(None, &token);
        let response = self
            .http
            .patch(&url)
            .json(&Value::Object(fields))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(VelariumError::store(format!(
                "Record patch rejected: {}",
                response.status()
            )));
        }
        self.logger.debug("Patched record");
        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<Value>> {
        // The change stream stays open indefinitely, so it gets its own
        // client with only a connect timeout.
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        let (tx, rx) = mpsc::channel(32);
        let worker = StreamWorker {
            http,
            store: self.store.clone(),
            credentials: self.credentials.clone(),
            logger: get_logger("stream"),
        };
        tokio::spawn(async move {
            worker.run(tx).await;
        });
        Ok(rx)
    }
}

enum StreamEnd {
    /// The subscriber went away; the worker is done.
    ReceiverDropped,
    /// The store closed or revoked the stream; re-establish it.
    Reconnect,
}

struct StreamWorker {
    http: reqwest::Client,
    store: StoreConfig,
    credentials: CredentialsConfig,
    logger: StructuredLogger,
}

impl StreamWorker {
    async fn run(self, tx: mpsc::Sender<Value>) {
        let retry = std::time::Duration::from_secs(self.store.stream_retry_secs.max(1));
        let mut tree = Value::Null;

        loop {
            match self.stream_once(&tx, &mut tree).await {
                Ok(StreamEnd::ReceiverDropped) => return,
                Ok(StreamEnd::Reconnect) => {}
                Err(e) => self.logger.error(&format!("Change stream failed: {}", e)),
            }
            tokio::time::sleep(retry).await;
        }
    }

    async fn stream_once(&self, tx: &mpsc::Sender<Value>, tree: &mut Value) -> Result<StreamEnd> {
        let token = sign_in(&self.http, &self.store.api_key, &self.credentials).await?;
        let base = self.store.database_url.trim_end_matches('/');
        let url = format!(
            "{}/{}.json?auth={}",
            base, self.store.record_path, token.id_token
        );

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| VelariumError::subscription(e.to_string()))?;
        if !response.status().is_success() {
            return Err(VelariumError::subscription(format!(
                "Stream request rejected: {}",
                response.status()
            )));
        }

        self.logger.info("Change stream established");
        let mut body = response.bytes_stream();
        let mut parser = SseParser::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| VelariumError::subscription(e.to_string()))?;
            for event in parser.push(&chunk) {
                match event.name.as_str() {
                    "put" | "patch" => {
                        if self.apply_event(tree, &event.name, &event.data)
                            && tx.send(tree.clone()).await.is_err()
                        {
                            return Ok(StreamEnd::ReceiverDropped);
                        }
                    }
                    "keep-alive" => {}
                    "auth_revoked" => {
                        self.logger
                            .warn("Session revoked by store, re-authenticating");
                        return Ok(StreamEnd::Reconnect);
                    }
                    "cancel" => {
                        self.logger.warn("Change stream cancelled by store");
                        return Ok(StreamEnd::Reconnect);
                    }
                    other => self.logger.debug(&format!("Ignoring stream event '{}'", other)),
                }
            }
        }

        self.logger.warn("Change stream ended");
        Ok(StreamEnd::Reconnect)
    }

    /// Apply one put/patch event to the local tree; false when the payload
    /// could not be parsed (logged and skipped).
    fn apply_event(&self, tree: &mut Value, name: &str, data: &str) -> bool {
        #[derive(Deserialize)]
        struct EventPayload {
            path: String,
            data: Value,
        }

        match serde_json::from_str::<EventPayload>(data) {
            Ok(payload) => {
                if name == "patch" {
                    apply_patch(tree, &payload.path, payload.data);
                } else {
                    apply_put(tree, &payload.path, payload.data);
                }
                true
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Ignoring malformed stream payload: {}", e));
                false
            }
        }
    }
}
