//! Core library for `unsealer`.
//!
//! Contains the [`VaultClient`](client::VaultClient) capability trait with
//! its HTTP implementation, and the
//! [`UnsealOrchestrator`](orchestrator::UnsealOrchestrator) that composes a
//! keystore and a vault client to drive a vault from sealed/uninitialized to
//! unsealed. This crate depends on `unsealer-keystore` for the keystore
//! trait and knows nothing about concrete backends or process wiring.

pub mod client;
pub mod error;
pub mod http;
pub mod orchestrator;

pub use client::{InitResponse, SealStatus, VaultClient};
pub use error::{ClientError, OrchestratorError};
pub use http::HttpVaultClient;
pub use orchestrator::{UnsealOrchestrator, VaultOptions};
