//! Measurement mode and sense-prefix derivation.
//!
//! The DMM7510 splits its command tree by sense function: analog volt/current
//! functions live under `SENS:VOLT`/`SENS:CURR`, the digitizer under
//! `SENS:DIG`. Range and auto-range commands must target the family matching
//! the active function, so the driver caches the derived [`SensePrefix`] and
//! stamps it into every range command.

use std::fmt;

/// Active measurement function of the instrument.
///
/// Exactly one is active at a time; the instrument is authoritative and the
/// driver mirrors it locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementMode {
    /// DC voltage, analog sensing.
    VoltDc,
    /// AC voltage, analog sensing.
    VoltAc,
    /// DC current, analog sensing.
    CurrDc,
    /// AC current, analog sensing.
    CurrAc,
    /// Digitized voltage (fixed high-rate sampling, no user range).
    DigVolt,
    /// Digitized current (fixed high-rate sampling, no user range).
    DigCurr,
}

impl MeasurementMode {
    /// Parse the reply to `SENS:FUNC?` (quotes already stripped).
    ///
    /// `"NONE"` means analog sensing is disabled and is not a mode by itself;
    /// the resolver follows up with `SENS:DIG:FUNC?` in that case.
    pub fn from_sense_function(function: &str) -> Option<Self> {
        match function {
            "VOLT:DC" => Some(Self::VoltDc),
            "VOLT:AC" => Some(Self::VoltAc),
            "CURR:DC" => Some(Self::CurrDc),
            "CURR:AC" => Some(Self::CurrAc),
            _ => None,
        }
    }

    /// Parse the reply to `SENS:DIG:FUNC?` (quotes already stripped).
    pub fn from_digitize_function(function: &str) -> Option<Self> {
        match function {
            "VOLT" => Some(Self::DigVolt),
            "CURR" => Some(Self::DigCurr),
            _ => None,
        }
    }

    /// The function-select command that activates this mode.
    ///
    /// Analog and digitizer modes use different command families.
    pub fn select_command(&self) -> String {
        match self {
            Self::VoltDc => ":SENS:FUNC \"VOLT:DC\"".to_string(),
            Self::VoltAc => ":SENS:FUNC \"VOLT:AC\"".to_string(),
            Self::CurrDc => ":SENS:FUNC \"CURR:DC\"".to_string(),
            Self::CurrAc => ":SENS:FUNC \"CURR:AC\"".to_string(),
            Self::DigVolt => ":SENS:DIG:FUNC \"VOLT\"".to_string(),
            Self::DigCurr => ":SENS:DIG:FUNC \"CURR\"".to_string(),
        }
    }

    /// Whether this mode samples through the digitizer function tree.
    pub fn is_digitize(&self) -> bool {
        matches!(self, Self::DigVolt | Self::DigCurr)
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VoltDc => "VoltDC",
            Self::VoltAc => "VoltAC",
            Self::CurrDc => "CurrDC",
            Self::CurrAc => "CurrAC",
            Self::DigVolt => "DigVolt",
            Self::DigCurr => "DigCurr",
        };
        f.write_str(name)
    }
}

/// Command-family token for range-related SCPI subtrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensePrefix {
    /// `SENS:VOLT` subtree.
    Volt,
    /// `SENS:CURR` subtree.
    Curr,
    /// `SENS:DIG` subtree; range and auto-range do not apply.
    Dig,
}

impl SensePrefix {
    /// Token as it appears inside SCPI commands.
    pub fn as_scpi(&self) -> &'static str {
        match self {
            Self::Volt => "VOLT",
            Self::Curr => "CURR",
            Self::Dig => "DIG",
        }
    }

    /// Prefix for a resolution result that may have failed.
    ///
    /// An unrecognized function defaults to `Dig`, which disables range
    /// access rather than raising. This mirrors the instrument-observed
    /// behaviour; it does conflate "truly digitizing" with "unparseable
    /// reply".
    pub fn for_resolved(mode: Option<MeasurementMode>) -> Self {
        mode.map_or(Self::Dig, Self::from)
    }
}

impl From<MeasurementMode> for SensePrefix {
    fn from(mode: MeasurementMode) -> Self {
        match mode {
            MeasurementMode::VoltDc | MeasurementMode::VoltAc => Self::Volt,
            MeasurementMode::CurrDc | MeasurementMode::CurrAc => Self::Curr,
            MeasurementMode::DigVolt | MeasurementMode::DigCurr => Self::Dig,
        }
    }
}

impl fmt::Display for SensePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_scpi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_derivation_table() {
        assert_eq!(SensePrefix::from(MeasurementMode::VoltDc), SensePrefix::Volt);
        assert_eq!(SensePrefix::from(MeasurementMode::VoltAc), SensePrefix::Volt);
        assert_eq!(SensePrefix::from(MeasurementMode::CurrDc), SensePrefix::Curr);
        assert_eq!(SensePrefix::from(MeasurementMode::CurrAc), SensePrefix::Curr);
        assert_eq!(SensePrefix::from(MeasurementMode::DigVolt), SensePrefix::Dig);
        assert_eq!(SensePrefix::from(MeasurementMode::DigCurr), SensePrefix::Dig);
    }

    #[test]
    fn test_unresolved_mode_defaults_to_dig() {
        assert_eq!(SensePrefix::for_resolved(None), SensePrefix::Dig);
        assert_eq!(
            SensePrefix::for_resolved(Some(MeasurementMode::CurrAc)),
            SensePrefix::Curr
        );
    }

    #[test]
    fn test_sense_function_parsing() {
        assert_eq!(
            MeasurementMode::from_sense_function("VOLT:DC"),
            Some(MeasurementMode::VoltDc)
        );
        assert_eq!(
            MeasurementMode::from_sense_function("CURR:AC"),
            Some(MeasurementMode::CurrAc)
        );
        // "NONE" is not a mode; the resolver escalates to the digitizer query.
        assert_eq!(MeasurementMode::from_sense_function("NONE"), None);
        assert_eq!(MeasurementMode::from_sense_function("RES"), None);
    }

    #[test]
    fn test_digitize_function_parsing() {
        assert_eq!(
            MeasurementMode::from_digitize_function("VOLT"),
            Some(MeasurementMode::DigVolt)
        );
        assert_eq!(
            MeasurementMode::from_digitize_function("CURR"),
            Some(MeasurementMode::DigCurr)
        );
        assert_eq!(MeasurementMode::from_digitize_function("NONE"), None);
    }

    #[test]
    fn test_select_commands() {
        assert_eq!(
            MeasurementMode::VoltDc.select_command(),
            ":SENS:FUNC \"VOLT:DC\""
        );
        assert_eq!(
            MeasurementMode::CurrAc.select_command(),
            ":SENS:FUNC \"CURR:AC\""
        );
        assert_eq!(
            MeasurementMode::DigVolt.select_command(),
            ":SENS:DIG:FUNC \"VOLT\""
        );
        assert_eq!(
            MeasurementMode::DigCurr.select_command(),
            ":SENS:DIG:FUNC \"CURR\""
        );
    }

    #[test]
    fn test_digitize_flag() {
        assert!(MeasurementMode::DigVolt.is_digitize());
        assert!(MeasurementMode::DigCurr.is_digitize());
        assert!(!MeasurementMode::VoltDc.is_digitize());
        assert!(!MeasurementMode::CurrAc.is_digitize());
    }
}
