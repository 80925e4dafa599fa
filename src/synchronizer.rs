//! Core synchronizer logic for Velarium
//!
//! The synchronizer owns the single persistent subscription to the shared
//! record and the cached derived view. On every change notification the
//! whole [`DerivedAwningState`] is recomputed from scratch and republished
//! on a watch channel; the subscription loop is the only writer of that
//! channel. Command issuance lives in [`crate::commands`] and writes to the
//! store independently, never reaching into the cache.

use crate::config::Config;
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use crate::status::{DerivedAwningState, RemoteAwningRecord, derive_state};
use crate::store::RemoteStore;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Synchronizer lifecycle state
#[derive(Debug, Clone)]
pub enum SyncState {
    /// Synchronizer is initializing
    Initializing,
    /// Subscription established, notifications flowing
    Listening,
    /// Synchronizer is in error state
    Error(String),
    /// Synchronizer is shutting down
    ShuttingDown,
}

/// Cloneable handle used to request a shutdown from other tasks
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ShutdownHandle {
    /// Request shutdown
    pub fn request(&self) {
        self.tx.send(()).ok();
    }
}

/// Awning state synchronizer
pub struct AwningSynchronizer {
    /// Configuration
    config: Config,

    /// Remote store client
    store: Arc<dyn RemoteStore>,

    /// Logger with context
    logger: StructuredLogger,

    /// Current lifecycle state
    state: watch::Sender<SyncState>,

    /// Latest derived state; None until the first notification arrives
    derived_tx: watch::Sender<Option<Arc<DerivedAwningState>>>,
    derived_rx: watch::Receiver<Option<Arc<DerivedAwningState>>>,

    /// Shutdown signal
    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,

    /// Notification counters
    notifications: u64,
    rejected: u64,
}

impl AwningSynchronizer {
    /// Create a new synchronizer instance
    pub fn new(config: Config, store: Arc<dyn RemoteStore>) -> Self {
        let logger = get_logger("synchronizer");
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(SyncState::Initializing);
        let (derived_tx, derived_rx) = watch::channel(None);

        Self {
            config,
            store,
            logger,
            state: state_tx,
            derived_tx,
            derived_rx,
            shutdown_tx,
            shutdown_rx,
            notifications: 0,
            rejected: 0,
        }
    }

    /// Run the synchronizer main loop
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info("Starting awning synchronizer main loop");

        // Establish the session up front; a failure here is logged but the
        // subscription transport signs in on its own.
        if let Err(e) = self.store.ensure_signed_in().await {
            self.logger
                .warn(&format!("Initial sign-in failed, continuing: {}", e));
        }

        let mut updates = match self.store.subscribe().await {
            Ok(rx) => rx,
            Err(e) => {
                self.state.send(SyncState::Error(e.to_string())).ok();
                return Err(e);
            }
        };

        self.state.send(SyncState::Listening).ok();
        self.logger.info(&format!(
            "Listening for changes on record '{}'",
            self.config.store.record_path
        ));

        loop {
            tokio::select! {
                maybe_value = updates.recv() => {
                    match maybe_value {
                        Some(value) => self.handle_notification(value),
                        None => {
                            self.logger.warn("Change stream ended");
                            break;
                        }
                    }
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.state.send(SyncState::ShuttingDown).ok();
        self.logger.info(&format!(
            "Synchronizer shutdown complete ({} notifications, {} rejected)",
            self.notifications, self.rejected
        ));
        Ok(())
    }

    /// Process one change notification: recompute the derived state from
    /// scratch and replace the cached value wholesale.
    fn handle_notification(&mut self, value: serde_json::Value) {
        self.notifications = self.notifications.saturating_add(1);

        match serde_json::from_value::<RemoteAwningRecord>(value) {
            Ok(record) => {
                let derived = derive_state(&record);
                self.logger.debug(&format!(
                    "Record change: status={:?} progress={:?} quality={}%",
                    derived.status, derived.progress, derived.network_quality
                ));
                self.derived_tx.send(Some(Arc::new(derived))).ok();
            }
            Err(e) => {
                // Malformed notification: keep the previously published state
                self.rejected = self.rejected.saturating_add(1);
                self.logger
                    .warn(&format!("Ignoring malformed record notification: {}", e));
            }
        }
    }

    /// Subscribe to derived state updates
    pub fn subscribe_state(&self) -> watch::Receiver<Option<Arc<DerivedAwningState>>> {
        self.derived_rx.clone()
    }

    /// Get current lifecycle state
    pub fn get_state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// Handle used to request shutdown from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }
}
