//! Command issuance for the awning record
//!
//! Each operation translates an operator intent into field writes on the
//! shared record. Commands are fire-and-forget with respect to each other:
//! no mutual exclusion, no queue, no retry; the last remote write wins.
//! Failures (authentication or write) are logged and reported as a `false`
//! return, never raised.

use crate::config::CommandsConfig;
use crate::logging::{StructuredLogger, get_logger};
use crate::status::{AwningStatus, DerivedAwningState, StatusCode};
use crate::store::RemoteStore;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Cheap-clone handle for issuing awning commands.
///
/// Reads movement durations from the latest derived state through a watch
/// receiver; it never mutates the cache.
#[derive(Clone)]
pub struct CommandIssuer {
    store: Arc<dyn RemoteStore>,
    commands: CommandsConfig,
    state_rx: watch::Receiver<Option<Arc<DerivedAwningState>>>,
    logger: StructuredLogger,
}

impl CommandIssuer {
    /// Create a new command issuer
    pub fn new(
        commands: CommandsConfig,
        store: Arc<dyn RemoteStore>,
        state_rx: watch::Receiver<Option<Arc<DerivedAwningState>>>,
    ) -> Self {
        Self {
            store,
            commands,
            state_rx,
            logger: get_logger("commands"),
        }
    }

    /// Request the awning to open
    pub async fn request_open(&self) -> bool {
        self.request_move(StatusCode::Open).await
    }

    /// Request the awning to close
    pub async fn request_close(&self) -> bool {
        self.request_move(StatusCode::Close).await
    }

    /// Request the awning to stop immediately
    pub async fn request_stop(&self) -> bool {
        if !self.ensure_signed_in().await {
            return false;
        }
        self.logger.info("Requesting stop");
        self.write("requested_status", json!(StatusCode::Stop.code()))
            .await
    }

    /// Force the record to a terminal status.
    ///
    /// Correction path for when the reported state has drifted from reality
    /// (e.g. manual intervention). Only `Opened` and `Closed` are accepted;
    /// any other target is a no-op. The three fields are patched atomically
    /// so no intermediate read can observe a transitional mismatch.
    pub async fn force_status(&self, target: AwningStatus) -> bool {
        let code = match target {
            AwningStatus::Opened => StatusCode::Open,
            AwningStatus::Closed => StatusCode::Close,
            _ => {
                self.logger
                    .debug(&format!("Ignoring force request for {:?}", target));
                return true;
            }
        };

        if !self.ensure_signed_in().await {
            return false;
        }

        let mut fields = serde_json::Map::new();
        fields.insert("requested_status".to_string(), json!(code.code()));
        fields.insert("status".to_string(), json!(code.code()));
        fields.insert("progress".to_string(), json!(0));

        match self.store.update(fields).await {
            Ok(()) => {
                self.logger.info(&format!("Forced status to {:?}", target));
                true
            }
            Err(e) => {
                self.logger
                    .error(&format!("Failed to force status to {:?}: {}", target, e));
                false
            }
        }
    }

    /// Set the opening duration, in milliseconds
    pub async fn set_opening_time(&self, ms: u64) -> bool {
        if !self.ensure_signed_in().await {
            return false;
        }
        self.write("opening_duration", json!(ms)).await
    }

    /// Set the closing duration, in milliseconds
    pub async fn set_closing_time(&self, ms: u64) -> bool {
        if !self.ensure_signed_in().await {
            return false;
        }
        self.write("closing_duration", json!(ms)).await
    }

    /// Open/close share the same shape: write the movement duration for the
    /// direction, give it a moment to propagate, then write the requested
    /// status. The delay is an ordering hint, not a guarantee.
    async fn request_move(&self, direction: StatusCode) -> bool {
        if !self.ensure_signed_in().await {
            return false;
        }

        let duration = self.movement_duration(direction);
        self.logger.info(&format!(
            "Requesting {:?} with duration {} ms",
            direction, duration
        ));

        if !self.write("duration", json!(duration)).await {
            return false;
        }

        sleep(Duration::from_millis(self.commands.settle_delay_ms)).await;

        self.write("requested_status", json!(direction.code()))
            .await
    }

    /// Duration for a movement direction, from the latest derived state or
    /// the configured default before the first notification has arrived.
    fn movement_duration(&self, direction: StatusCode) -> u64 {
        match self.state_rx.borrow().as_ref() {
            Some(state) => {
                if direction == StatusCode::Open {
                    state.opening_duration_ms
                } else {
                    state.closing_duration_ms
                }
            }
            None => self.commands.default_duration_ms,
        }
    }

    async fn ensure_signed_in(&self) -> bool {
        match self.store.ensure_signed_in().await {
            Ok(()) => true,
            Err(e) => {
                self.logger.error(&format!("Authentication failed: {}", e));
                false
            }
        }
    }

    async fn write(&self, key: &str, value: serde_json::Value) -> bool {
        match self.store.write(key, value).await {
            Ok(()) => true,
            Err(e) => {
                self.logger
                    .error(&format!("Failed to write '{}': {}", key, e));
                false
            }
        }
    }
}
