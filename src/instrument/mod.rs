//! Keithley DMM7510 instrument driver.

pub mod dmm7510;
pub mod mode;
pub mod trigger;

pub use dmm7510::{Dmm7510, InstrumentState, Reading, StatisticsSnapshot};
pub use mode::{MeasurementMode, SensePrefix};
