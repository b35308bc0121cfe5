//! Async Rust client for the Haven Availability appliance management
//! APIs.
//!
//! Haven Availability ships as four appliance roles -- manager, cloud,
//! replicator, and tunnel -- each exposing an HTTPS JSON API trusted
//! through a pinned per-appliance service certificate. This crate
//! provides the [`ApplianceClient`] operation set over those APIs, the
//! session-token protocol, the [`TaskPoller`] for server-side
//! asynchronous tasks, certificate [`thumbprint`] helpers, and typed
//! [`health`] payloads.
//!
//! The client is deliberately connection-per-call: every operation
//! fetches a fresh session token and builds a single-use transport
//! pinned to the certificate supplied for that call. Reconciliation
//! traffic is low-volume; simplicity wins over handshake reuse.

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod models;
pub mod replicators;
pub mod sites;
pub mod tasks;
pub mod thumbprint;
pub mod transport;

pub use client::{ApplianceClient, MANAGER_API_PORT};
pub use error::Error;
pub use tasks::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT, TaskPoller};
pub use thumbprint::{thumbprint_from_file, thumbprint_from_host};
pub use transport::build_transport;
