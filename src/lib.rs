//! Control library for the Keithley DMM7510 digital multimeter.
//!
//! Maps an abstract multimeter control model (measurement mode, range,
//! auto-range, trigger programs, trace statistics) onto the instrument's
//! SCPI command set. Transport is pluggable behind the
//! [`adapters::ScpiAdapter`] trait; a VISA implementation is available with
//! the `instrument_visa` feature and a scripted mock ships for tests.

pub mod adapters;
pub mod config;
pub mod error;
pub mod instrument;

pub use config::Dmm7510Config;
pub use error::{DmmError, DmmResult};
pub use instrument::{
    Dmm7510, InstrumentState, MeasurementMode, Reading, SensePrefix, StatisticsSnapshot,
};
