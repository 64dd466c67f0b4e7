//! Trigger-model program construction.
//!
//! The DMM7510 runs trigger programs on an on-board state machine made of
//! indexed blocks. Each block implicitly links to the next by its slot
//! index, so a program is an ordered command sequence whose indices must be
//! emitted exactly as the instrument expects. The slot assignments are a
//! fixed protocol encoding; they live in [`block`] rather than inline in the
//! format strings so a variant with a different layout is a data change.

/// Reading buffer targeted by digitize blocks.
pub const DEFAULT_BUFFER: &str = "defbuffer1";

/// Trigger-model slot assignments for the external-edge program.
pub mod block {
    /// Block 1: clear the reading buffer.
    pub const BUFFER_CLEAR: u8 = 1;
    /// Block 2: wait for an external edge; also the branch-back target.
    pub const WAIT_EXTERNAL: u8 = 2;
    /// Block 3: consume the pending trigger event.
    pub const CONSUME_EVENT: u8 = 3;
    /// Block 4: digitize into the default buffer.
    pub const DIGITIZE: u8 = 4;
    /// Block 5: branch back to the wait block.
    pub const BRANCH: u8 = 5;
}

/// Ordered SCPI commands forming one trigger-model program.
pub type TriggerProgram = Vec<String>;

/// Program that acquires for `duration` seconds in a loop.
///
/// Loads the instrument's built-in "DurationLoop" template. The trailing
/// zero is the repeat count the instrument reads as indefinite. Loading does
/// not arm the model; `INIT` is issued separately.
pub fn duration_loop(duration: f64) -> String {
    format!("TRIG:LOAD \"DurationLoop\", {duration:.6}, 0")
}

/// Program that digitizes a burst on each external rising edge.
///
/// Emits the strict five-block sequence: empty template, buffer clear, wait
/// for the external rising edge, consume the event, digitize
/// `digitize_count` samples into the default buffer, then branch back to the
/// wait block for `cycles` iterations.
pub fn external_edge(digitize_count: u32, cycles: u32) -> TriggerProgram {
    vec![
        ":TRIG:LOAD \"EMPTY\"".to_string(),
        format!(":TRIG:BLOC:BUFF:CLEAR {}", block::BUFFER_CLEAR),
        format!(":TRIGger:BLOCk:WAIT {}, EXT, ENT", block::WAIT_EXTERNAL),
        ":TRIG:EXT:IN:EDGE RIS".to_string(),
        format!(":TRIG:BLOC:DEL:CONS {}, 0", block::CONSUME_EVENT),
        format!(
            ":TRIG:BLOC:DIGITIZE {}, \"{}\", {}",
            block::DIGITIZE,
            DEFAULT_BUFFER,
            digitize_count
        ),
        format!(
            ":TRIG:BLOC:BRAN:COUN {}, {}, {}",
            block::BRANCH,
            cycles,
            block::WAIT_EXTERNAL
        ),
    ]
}
