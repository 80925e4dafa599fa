//! Remote store access for the shared awning record
//!
//! The cloud database is treated as an external collaborator: a JSON tree
//! addressed by key paths, supporting single-field writes, multi-field
//! patches, and a change-subscription stream of full record values. The
//! trait seam keeps the synchronizer and command issuer independent of the
//! transport; [`firebase::FirebaseStore`] is the production client and
//! [`memory::MemoryStore`] backs tests and offline development.

use crate::error::Result;
use tokio::sync::mpsc;

pub mod firebase;
pub mod memory;
pub mod sse;

pub use firebase::FirebaseStore;
pub use memory::MemoryStore;

/// Access to the shared awning record.
///
/// Keys are relative to the record root (`"duration"`,
/// `"requested_status"`, ...). Implementations must be safe to share across
/// tasks; command issuance and the change subscription run concurrently.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Establish a session from stored credentials if none exists.
    ///
    /// Every command is preceded by this step; a cached valid session makes
    /// it a no-op.
    async fn ensure_signed_in(&self) -> Result<()>;

    /// Write a single field of the record.
    async fn write(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Apply an atomic multi-field patch to the record.
    async fn update(&self, fields: serde_json::Map<String, serde_json::Value>) -> Result<()>;

    /// Subscribe to the record's value-change stream.
    ///
    /// The receiver yields the full record value after every change, the
    /// first element promptly reflecting the current value. The stream ends
    /// only when the receiver is dropped.
    async fn subscribe(&self) -> Result<mpsc::Receiver<serde_json::Value>>;
}
