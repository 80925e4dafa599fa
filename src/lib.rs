//! # Velarium - Awning Remote-Control State Synchronizer
//!
//! A Rust daemon that mirrors the state of a motorized awning through a
//! shared record in a cloud-hosted realtime document store, deriving a
//! user-facing status from the raw device fields and issuing movement
//! commands on behalf of its clients.
//!
//! ## Features
//!
//! - **Status Derivation**: five-value status computed from the requested
//!   and confirmed position codes
//! - **Change Subscription**: one persistent stream of record changes feeds
//!   a watch channel of derived states
//! - **Command Issuance**: open/close/stop, terminal-status correction, and
//!   movement-duration settings
//! - **Web Interface**: REST API and SSE event stream for presentation
//!   clients
//! - **Configuration**: YAML-based configuration with validation
//!
//! ## Architecture
//!
//! The application follows a modular architecture with clear separation of concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `status`: Record data model and status derivation
//! - `store`: Remote store clients (Firebase REST/SSE, in-memory)
//! - `synchronizer`: Change-subscription loop and cached derived state
//! - `commands`: Command issuance against the shared record
//! - `web`: HTTP server and SSE stream

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod status;
pub mod store;
pub mod synchronizer;
pub mod web;

mod web_tests;

// Re-export commonly used types
pub use commands::CommandIssuer;
pub use config::Config;
pub use error::{Result, VelariumError};
pub use status::{AwningStatus, DerivedAwningState, RemoteAwningRecord, derive_state};
pub use synchronizer::AwningSynchronizer;
