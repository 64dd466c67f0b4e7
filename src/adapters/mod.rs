//! Transport adapter implementations.
//!
//! This module contains implementations of the [`ScpiAdapter`] trait,
//! providing low-level request/response I/O for the SCPI link. The driver
//! never touches a socket or VISA session directly; it talks to one adapter.

use anyhow::Result;
use async_trait::async_trait;

pub mod mock_adapter;
#[cfg(feature = "instrument_visa")]
pub mod visa_adapter;

pub use mock_adapter::MockAdapter;
#[cfg(feature = "instrument_visa")]
pub use visa_adapter::VisaAdapter;

/// Synchronous request/response channel carrying SCPI strings.
///
/// The link supports one outstanding request at a time: a `query` or `send`
/// must complete before the next is issued. Implementations are expected to
/// fail with a transport error on disconnect or timeout and perform no
/// retries of their own.
#[async_trait]
pub trait ScpiAdapter: Send + Sync {
    /// Open the underlying resource.
    async fn connect(&mut self) -> Result<()>;

    /// Close the underlying resource. Idempotent.
    async fn disconnect(&mut self) -> Result<()>;

    /// Send a command and wait for a single-line response.
    async fn query(&mut self, command: &str) -> Result<String>;

    /// Send a command with no response expected.
    async fn send(&mut self, command: &str) -> Result<()>;

    /// Whether the underlying resource is currently open.
    fn is_connected(&self) -> bool;

    /// Human-readable adapter description for logs.
    fn info(&self) -> String;
}
