//! Keithley DMM7510 session driver.
//!
//! Owns the transport adapter and the only pieces of session state the
//! protocol requires: the cached sense prefix (which command family range
//! operations must target) and the last forced reading. Everything else is
//! read live from the instrument.
//!
//! All operations take `&mut self`, so a session serializes its own traffic;
//! the link carries one outstanding request at a time. Callers that share a
//! session across tasks wrap it in one exclusive lock, keeping a mode write
//! and the prefix-dependent operations that follow it a single unit.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::adapters::ScpiAdapter;
use crate::config::Dmm7510Config;
use crate::error::{DmmError, DmmResult};

use super::mode::{MeasurementMode, SensePrefix};
use super::trigger;

/// Lifecycle state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstrumentState {
    /// No transport open.
    Disconnected,
    /// Connected and initialized.
    Ready,
    /// Connection could not be established or was lost fatally.
    Fault(String),
}

/// A measurement forced by [`Dmm7510::read`], kept as the session's
/// last value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Measured value in the active function's unit.
    pub value: f64,
    /// When the reading was taken.
    pub timestamp: DateTime<Utc>,
}

/// Trace statistics of the reading buffer, read live in one sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticsSnapshot {
    /// Mean of the buffered readings.
    pub average: f64,
    /// Peak-to-peak spread.
    pub peak_to_peak: f64,
    /// Standard deviation.
    pub std_dev: f64,
    /// Number of readings in the buffer.
    pub span: f64,
    /// Minimum buffered reading.
    pub min: f64,
    /// Maximum buffered reading.
    pub max: f64,
}

/// Driver for one Keithley DMM7510 session.
pub struct Dmm7510 {
    config: Dmm7510Config,
    adapter: Box<dyn ScpiAdapter>,
    state: InstrumentState,
    sense_prefix: SensePrefix,
    last_reading: Option<Reading>,
}

impl Dmm7510 {
    /// Create a session over a VISA transport built from the configuration.
    #[cfg(feature = "instrument_visa")]
    pub fn new(config: Dmm7510Config) -> Self {
        let adapter = crate::adapters::VisaAdapter::new(config.resource_string.clone())
            .with_timeout(config.timeout())
            .with_line_terminator(config.line_terminator.clone());
        Self::with_adapter(config, Box::new(adapter))
    }

    /// Create a session over a caller-supplied transport.
    pub fn with_adapter(config: Dmm7510Config, adapter: Box<dyn ScpiAdapter>) -> Self {
        Self {
            config,
            adapter,
            state: InstrumentState::Disconnected,
            // Until the first successful mode resolution range access is
            // disabled, which Dig encodes.
            sense_prefix: SensePrefix::Dig,
            last_reading: None,
        }
    }

    /// Connect, confirm identity, and seed the session caches.
    ///
    /// Queries `*IDN?` for the log only, resolves the active function to
    /// seed the sense-prefix cache, then forces one reading as the initial
    /// last value. Connection failure is fatal; the session moves to
    /// [`InstrumentState::Fault`] and no reconnect is attempted.
    pub async fn initialize(&mut self) -> DmmResult<()> {
        info!("Connecting to {} ...", self.adapter.info());

        if let Err(e) = self.adapter.connect().await {
            self.state = InstrumentState::Fault(e.to_string());
            return Err(DmmError::ConnectionFailure(e));
        }

        let idn = self.query("*IDN?").await?;
        info!("Connection established: {idn}");

        match self.resolve_mode().await? {
            Some(mode) => info!("Active function: {mode} (prefix {})", self.sense_prefix),
            None => warn!("Unrecognized sense function; range access disabled"),
        }

        self.read().await?;
        self.state = InstrumentState::Ready;
        Ok(())
    }

    /// Close the transport and drop session state.
    pub async fn shutdown(&mut self) -> DmmResult<()> {
        self.adapter.disconnect().await?;
        self.state = InstrumentState::Disconnected;
        self.sense_prefix = SensePrefix::Dig;
        self.last_reading = None;
        info!("DMM7510 session closed");
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &InstrumentState {
        &self.state
    }

    /// The cached command-family prefix for range operations.
    pub fn sense_prefix(&self) -> SensePrefix {
        self.sense_prefix
    }

    /// Session configuration.
    pub fn config(&self) -> &Dmm7510Config {
        &self.config
    }

    async fn send(&mut self, command: &str) -> DmmResult<()> {
        if !self.adapter.is_connected() {
            return Err(DmmError::NotConnected);
        }
        self.adapter.send(command).await.map_err(DmmError::Transport)
    }

    async fn query(&mut self, command: &str) -> DmmResult<String> {
        if !self.adapter.is_connected() {
            return Err(DmmError::NotConnected);
        }
        self.adapter.query(command).await.map_err(DmmError::Transport)
    }

    async fn query_f64(&mut self, command: &str) -> DmmResult<f64> {
        let response = self.query(command).await?;
        response
            .trim()
            .parse::<f64>()
            .map_err(|_| DmmError::MalformedResponse {
                command: command.to_string(),
                response,
            })
    }

    // ------------------------------------------------------------------
    // Mode resolution
    // ------------------------------------------------------------------

    /// Query the active sense function and refresh the prefix cache.
    ///
    /// `SENS:FUNC?` reporting `NONE` means analog sensing is off; a second
    /// query against the digitizer tree then distinguishes the digitize
    /// modes. Returns `None` when neither reply is recognized; that is not
    /// fatal, but it leaves range access disabled.
    pub async fn resolve_mode(&mut self) -> DmmResult<Option<MeasurementMode>> {
        let function = self.query("SENS:FUNC?").await?;
        let function = function.trim().trim_matches('"').to_string();

        let mode = if function == "NONE" {
            let digitize = self.query("SENS:DIG:FUNC?").await?;
            MeasurementMode::from_digitize_function(digitize.trim().trim_matches('"'))
        } else {
            MeasurementMode::from_sense_function(&function)
        };

        self.sense_prefix = SensePrefix::for_resolved(mode);
        debug!("Resolved function '{function}' -> prefix {}", self.sense_prefix);
        Ok(mode)
    }

    /// Select a measurement function.
    ///
    /// Updates the cached prefix by the pure mode-to-prefix mapping; with
    /// the target mode known there is nothing to re-query.
    pub async fn set_measurement_mode(&mut self, mode: MeasurementMode) -> DmmResult<()> {
        self.send(&mode.select_command()).await?;
        self.sense_prefix = mode.into();
        info!("Measurement mode set to {mode} (prefix {})", self.sense_prefix);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Range / auto-range (prefix-gated)
    // ------------------------------------------------------------------

    /// Read the measurement range of the active function.
    ///
    /// Not applicable in digitize mode: returns `f64::NAN` without touching
    /// the instrument.
    pub async fn range(&mut self) -> DmmResult<f64> {
        if self.sense_prefix == SensePrefix::Dig {
            return Ok(f64::NAN);
        }
        let command = format!("SENS:{}:RANG?", self.sense_prefix.as_scpi());
        self.query_f64(&command).await
    }

    /// Set the measurement range of the active function.
    ///
    /// The instrument snaps the value to the nearest supported range; no
    /// local validation or rounding. No-op in digitize mode.
    pub async fn set_range(&mut self, value: f64) -> DmmResult<()> {
        if self.sense_prefix == SensePrefix::Dig {
            debug!("Range not applicable in digitize mode; ignoring write");
            return Ok(());
        }
        let command = format!("SENS:{}:RANG {value:.6}", self.sense_prefix.as_scpi());
        self.send(&command).await
    }

    /// Read the auto-range flag, or `None` in digitize mode.
    pub async fn auto_range(&mut self) -> DmmResult<Option<bool>> {
        if self.sense_prefix == SensePrefix::Dig {
            return Ok(None);
        }
        let command = format!("SENS:{}:RANG:AUTO?", self.sense_prefix.as_scpi());
        let response = self.query(&command).await?;
        match response.trim() {
            "0" => Ok(Some(false)),
            "1" => Ok(Some(true)),
            _ => Err(DmmError::MalformedResponse { command, response }),
        }
    }

    /// Set the auto-range flag. No-op in digitize mode.
    pub async fn set_auto_range(&mut self, enabled: bool) -> DmmResult<()> {
        if self.sense_prefix == SensePrefix::Dig {
            debug!("Auto-range not applicable in digitize mode; ignoring write");
            return Ok(());
        }
        let command = format!(
            "SENS:{}:RANG:AUTO {}",
            self.sense_prefix.as_scpi(),
            u8::from(enabled)
        );
        self.send(&command).await
    }

    // ------------------------------------------------------------------
    // Trigger model
    // ------------------------------------------------------------------

    /// Load the duration-loop trigger program.
    ///
    /// Loading only configures the model; arm it with [`Self::initiate`].
    pub async fn trigger_duration_loop(&mut self, duration: f64) -> DmmResult<()> {
        let command = trigger::duration_loop(duration);
        self.send(&command).await?;
        info!("Loaded DurationLoop trigger program ({duration} s)");
        Ok(())
    }

    /// Load the external-edge digitize trigger program.
    ///
    /// Digitizes the configured per-edge sample count on each external
    /// rising edge, for `cycles` edges.
    pub async fn trigger_external(&mut self, cycles: u32) -> DmmResult<()> {
        let digitize_count = self.config.digitize_count;
        for command in trigger::external_edge(digitize_count, cycles) {
            self.send(&command).await?;
        }
        info!(
            "Loaded external-edge trigger program ({digitize_count} samples x {cycles} cycles)"
        );
        Ok(())
    }

    /// Arm the loaded trigger model.
    pub async fn initiate(&mut self) -> DmmResult<()> {
        self.send("INIT").await
    }

    /// Restore free-run continuous re-arming.
    pub async fn continuous(&mut self) -> DmmResult<()> {
        self.send("TRIG:CONT REST").await
    }

    /// Abort a running trigger model.
    pub async fn abort(&mut self) -> DmmResult<()> {
        self.send(":TRIG:ABOR").await
    }

    /// Clear the trace statistics accumulators.
    pub async fn clear_statistics(&mut self) -> DmmResult<()> {
        self.send(":TRAC:STAT:CLE").await
    }

    /// Clear the reading buffer.
    pub async fn clear_trace(&mut self) -> DmmResult<()> {
        self.send(":TRAC:CLE").await
    }

    /// Trigger-model state, text before the first `;` of `:TRIG:STAT?`.
    pub async fn trigger_status(&mut self) -> DmmResult<String> {
        let response = self.query(":TRIG:STAT?").await?;
        Ok(response
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    // ------------------------------------------------------------------
    // Readings and statistics
    // ------------------------------------------------------------------

    /// Fetch the most recent reading without triggering a new one.
    pub async fn fetch(&mut self) -> DmmResult<f64> {
        self.query_f64(":FETC?").await
    }

    /// Force a fresh measurement and keep it as the session's last reading.
    pub async fn read(&mut self) -> DmmResult<f64> {
        let value = self.query_f64(":READ?").await?;
        self.last_reading = Some(Reading {
            value,
            timestamp: Utc::now(),
        });
        Ok(value)
    }

    /// The reading cached by the most recent [`Self::read`].
    pub fn last_reading(&self) -> Option<Reading> {
        self.last_reading
    }

    /// Mean of the buffered readings.
    pub async fn stats_average(&mut self) -> DmmResult<f64> {
        self.query_f64(":TRAC:STAT:AVER?").await
    }

    /// Peak-to-peak spread of the buffered readings.
    pub async fn stats_peak_to_peak(&mut self) -> DmmResult<f64> {
        self.query_f64(":TRAC:STAT:PK2P?").await
    }

    /// Standard deviation of the buffered readings.
    pub async fn stats_std_dev(&mut self) -> DmmResult<f64> {
        self.query_f64(":TRAC:STAT:STDD?").await
    }

    /// Number of readings in the buffer.
    pub async fn stats_span(&mut self) -> DmmResult<f64> {
        self.query_f64(":TRAC:ACT?").await
    }

    /// Minimum buffered reading.
    pub async fn stats_min(&mut self) -> DmmResult<f64> {
        self.query_f64(":TRAC:STAT:MIN?").await
    }

    /// Maximum buffered reading.
    pub async fn stats_max(&mut self) -> DmmResult<f64> {
        self.query_f64(":TRAC:STAT:MAX?").await
    }

    /// All six trace statistics in one sweep of independent queries.
    pub async fn statistics(&mut self) -> DmmResult<StatisticsSnapshot> {
        Ok(StatisticsSnapshot {
            average: self.stats_average().await?,
            peak_to_peak: self.stats_peak_to_peak().await?,
            std_dev: self.stats_std_dev().await?,
            span: self.stats_span().await?,
            min: self.stats_min().await?,
            max: self.stats_max().await?,
        })
    }
}
