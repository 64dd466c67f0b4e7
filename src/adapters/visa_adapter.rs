//! VISA transport for GPIB/USB/Ethernet instruments.
//!
//! Wraps the `visa-rs` crate and provides the async [`ScpiAdapter`] surface
//! by running the synchronous VISA I/O on Tokio's blocking executor.
//!
//! Supports resource strings like:
//! - `GPIB0::1::INSTR` (GPIB interface)
//! - `USB0::0x05E6::0x7510::SERIAL::INSTR` (USB-TMC)
//! - `TCPIP::192.168.1.201::inst0::INSTR` (Ethernet/LXI)

use std::ffi::CString;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;
use visa_rs::prelude::*;

use super::ScpiAdapter;

struct VisaLink {
    // The resource manager owns the session; keep it alive alongside it.
    _rm: DefaultRM,
    instrument: Instrument,
}

/// VISA adapter for instrument communication.
pub struct VisaAdapter {
    resource_string: String,
    timeout: Duration,
    line_terminator: String,
    link: Option<Arc<Mutex<VisaLink>>>,
}

impl VisaAdapter {
    /// Create a new VISA adapter with default settings.
    pub fn new(resource_string: String) -> Self {
        Self {
            resource_string,
            timeout: Duration::from_secs(5),
            line_terminator: "\n".to_string(),
            link: None,
        }
    }

    /// Set the read/write timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the line terminator appended to commands.
    pub fn with_line_terminator(mut self, terminator: String) -> Self {
        self.line_terminator = terminator;
        self
    }

    fn link(&self) -> Result<Arc<Mutex<VisaLink>>> {
        self.link
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow!("VISA instrument not connected"))
    }

    fn terminated(&self, command: &str) -> String {
        format!("{}{}", command, self.line_terminator)
    }
}

#[async_trait]
impl ScpiAdapter for VisaAdapter {
    async fn connect(&mut self) -> Result<()> {
        let resource_string = self.resource_string.clone();

        let link = tokio::task::spawn_blocking(move || {
            let rm = DefaultRM::new().context("Failed to create VISA resource manager")?;
            let c_string = CString::new(resource_string.clone())
                .context("Resource string contains an interior NUL")?;
            let visa_string = visa_rs::VisaString::from(c_string);

            let instrument = rm
                .open(&visa_string, AccessMode::NO_LOCK, TIMEOUT_IMMEDIATE)
                .with_context(|| format!("Failed to open VISA resource: {resource_string}"))?;

            Ok::<VisaLink, anyhow::Error>(VisaLink {
                _rm: rm,
                instrument,
            })
        })
        .await
        .context("VISA open task panicked")??;

        self.link = Some(Arc::new(Mutex::new(link)));
        debug!(
            "VISA resource '{}' opened with {}ms timeout",
            self.resource_string,
            self.timeout.as_millis()
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.link.take().is_some() {
            debug!("VISA resource '{}' closed", self.resource_string);
        }
        Ok(())
    }

    async fn query(&mut self, command: &str) -> Result<String> {
        let link = self.link()?;
        let wire = self.terminated(command);
        let command_for_log = command.to_string();

        tokio::task::spawn_blocking(move || {
            let mut guard = link.blocking_lock();

            guard
                .instrument
                .write_all(wire.as_bytes())
                .with_context(|| format!("VISA write failed for: {command_for_log}"))?;

            let mut buf = [0u8; 1024];
            let bytes_read = guard
                .instrument
                .read(&mut buf)
                .with_context(|| format!("VISA read failed for: {command_for_log}"))?;

            let response = String::from_utf8_lossy(&buf[..bytes_read])
                .trim()
                .to_string();
            debug!("VISA query '{}' -> '{}'", command_for_log, response);
            Ok(response)
        })
        .await
        .context("VISA I/O task panicked")?
    }

    async fn send(&mut self, command: &str) -> Result<()> {
        let link = self.link()?;
        let wire = self.terminated(command);
        let command_for_log = command.to_string();

        tokio::task::spawn_blocking(move || {
            let mut guard = link.blocking_lock();

            guard
                .instrument
                .write_all(wire.as_bytes())
                .with_context(|| format!("VISA write failed for: {command_for_log}"))?;

            debug!("VISA command sent: {}", command_for_log);
            Ok(())
        })
        .await
        .context("VISA write task panicked")?
    }

    fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    fn info(&self) -> String {
        format!(
            "VisaAdapter({} @ {}ms timeout)",
            self.resource_string,
            self.timeout.as_millis()
        )
    }
}
