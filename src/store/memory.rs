//! In-memory store for tests and offline development
//!
//! Mirrors the observable behavior of the production client: every mutation
//! fans the full record out to all subscribers, and a new subscription
//! promptly receives the current value. An operation journal records the
//! order of writes so tests can assert command sequencing, and failure
//! toggles exercise the error paths.

use crate::error::{Result, VelariumError};
use crate::store::RemoteStore;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// One journaled store operation
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    /// Single-field write: key and value
    Write(String, Value),
    /// Atomic multi-field patch
    Update(serde_json::Map<String, Value>),
}

#[derive(Default)]
pub struct MemoryStore {
    record: Mutex<serde_json::Map<String, Value>>,
    subscribers: Mutex<Vec<mpsc::Sender<Value>>>,
    journal: Mutex<Vec<StoreOp>>,
    fail_auth: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an initial record
    pub fn with_record(record: serde_json::Map<String, Value>) -> Self {
        Self {
            record: Mutex::new(record),
            ..Default::default()
        }
    }

    /// Make `ensure_signed_in` fail
    pub fn set_fail_auth(&self, fail: bool) {
        self.fail_auth.store(fail, Ordering::SeqCst);
    }

    /// Make writes and updates fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the journaled operations, in issue order
    pub fn journal(&self) -> Vec<StoreOp> {
        self.journal.lock().map(|j| j.clone()).unwrap_or_default()
    }

    /// Current value of one record field
    pub fn field(&self, key: &str) -> Option<Value> {
        self.record.lock().ok().and_then(|r| r.get(key).cloned())
    }

    fn snapshot(&self) -> Value {
        self.record
            .lock()
            .map(|r| Value::Object(r.clone()))
            .unwrap_or(Value::Null)
    }

    async fn broadcast(&self) {
        let value = self.snapshot();
        let senders: Vec<mpsc::Sender<Value>> = match self.subscribers.lock() {
            Ok(subs) => subs.clone(),
            Err(_) => return,
        };
        for sender in senders {
            let _ = sender.send(value.clone()).await;
        }
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(VelariumError::store("write failure injected"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteStore for MemoryStore {
    async fn ensure_signed_in(&self) -> Result<()> {
        if self.fail_auth.load(Ordering::SeqCst) {
            return Err(VelariumError::auth("auth failure injected"));
        }
        Ok(())
    }

    async fn write(&self, key: &str, value: Value) -> Result<()> {
        self.check_writable()?;
        if let Ok(mut record) = self.record.lock() {
            record.insert(key.to_string(), value.clone());
        }
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(StoreOp::Write(key.to_string(), value));
        }
        self.broadcast().await;
        Ok(())
    }

    async fn update(&self, fields: serde_json::Map<String, Value>) -> Result<()> {
        self.check_writable()?;
        if let Ok(mut record) = self.record.lock() {
            for (key, value) in fields.clone() {
                record.insert(key, value);
            }
        }
        if let Ok(mut journal) = self.journal.lock() {
            journal.push(StoreOp::Update(fields));
        }
        self.broadcast().await;
        Ok(())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<Value>> {
        let (tx, rx) = mpsc::channel(32);
        // Deliver the current value first, as the production stream does
        let _ = tx.send(self.snapshot()).await;
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        Ok(rx)
    }
}
