//! Custom error types for the driver.
//!
//! This module defines the primary error type, `DmmError`, for the crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way
//! to handle the different kinds of failures a session can hit, from
//! configuration issues to transport loss and unparseable instrument replies.
//!
//! ## Error kinds
//!
//! - **`Config`**: Wraps errors from the `config` crate, typically related to
//!   file parsing or format issues in the configuration files.
//! - **`Configuration`**: Semantic errors in the configuration, such as values
//!   that parse fine but are logically invalid (e.g., a zero digitize count).
//!   These are caught during the validation step.
//! - **`ConnectionFailure`**: The transport could not be established. Fatal
//!   for the session; the driver does not reconnect on its own.
//! - **`NotConnected`**: An operation was attempted on a session whose
//!   adapter is not connected.
//! - **`Transport`**: The transport reported a failure mid-session (timeout,
//!   dropped link). Propagated unmodified; the driver performs no retries.
//! - **`MalformedResponse`**: A query reply did not have the expected
//!   numeric/string shape. Propagated to the caller, not retried.
//!
//! Note that accessing range or auto-range while the instrument is in a
//! digitize mode is deliberately *not* an error: those operations degrade to
//! a sentinel read / no-op write, preserving the distinction between "the
//! instrument rejected the command" and "the operation is not meaningful in
//! this mode".

use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type DmmResult<T> = std::result::Result<T, DmmError>;

/// Driver-level error for all DMM7510 session operations.
#[derive(Error, Debug)]
pub enum DmmError {
    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration parsed but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Transport could not be established. Fatal for the session.
    #[error("Connection failure: {0}")]
    ConnectionFailure(anyhow::Error),

    /// Operation attempted without a connected transport.
    #[error("Not connected to instrument")]
    NotConnected,

    /// Transport-reported failure during an established session.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),

    /// Query reply did not match the expected shape.
    #[error("Malformed response to '{command}': '{response}'")]
    MalformedResponse {
        /// The command whose reply failed to parse.
        command: String,
        /// The raw reply as received.
        response: String,
    },
}
