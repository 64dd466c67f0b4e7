//! One-shot command-line client for the DMM7510 driver.
//!
//! Connects over VISA, runs a single operation, and disconnects. Meant for
//! bench smoke checks, not automation.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use keithley_dmm7510::{Dmm7510, Dmm7510Config, MeasurementMode};

#[derive(Parser)]
#[command(name = "dmm7510-cli", about = "Keithley DMM7510 bench client")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the VISA resource string.
    #[arg(long)]
    resource: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    VoltDc,
    VoltAc,
    CurrDc,
    CurrAc,
    DigVolt,
    DigCurr,
}

impl From<ModeArg> for MeasurementMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::VoltDc => MeasurementMode::VoltDc,
            ModeArg::VoltAc => MeasurementMode::VoltAc,
            ModeArg::CurrDc => MeasurementMode::CurrDc,
            ModeArg::CurrAc => MeasurementMode::CurrAc,
            ModeArg::DigVolt => MeasurementMode::DigVolt,
            ModeArg::DigCurr => MeasurementMode::DigCurr,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Connect and report the resolved measurement mode.
    Identify,
    /// Force a fresh measurement and print it.
    Read,
    /// Print the trace statistics.
    Stats,
    /// Print the trigger-model status.
    Status,
    /// Get or set the measurement mode.
    Mode {
        /// Mode to select; omit to read the current one.
        #[arg(value_enum)]
        set: Option<ModeArg>,
    },
    /// Get or set the measurement range.
    Range {
        /// Range to set; omit to read the current one.
        set: Option<f64>,
    },
    /// Load the duration-loop trigger program.
    TriggerDuration {
        /// Acquisition duration in seconds.
        duration: f64,
    },
    /// Load the external-edge digitize trigger program.
    TriggerExternal {
        /// Number of external edges to service.
        cycles: u32,
    },
    /// Arm the loaded trigger model.
    Init,
    /// Abort a running trigger model.
    Abort,
    /// Restore free-run continuous triggering.
    Continuous,
    /// Clear the trace statistics accumulators.
    ClearStats,
    /// Clear the reading buffer.
    ClearTrace,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Dmm7510Config::load(cli.config.as_deref())?;
    if let Some(resource) = cli.resource {
        config.resource_string = resource;
    }

    let mut dmm = Dmm7510::new(config);
    dmm.initialize().await?;

    let outcome = run(&mut dmm, cli.command).await;
    dmm.shutdown().await?;
    outcome
}

async fn run(dmm: &mut Dmm7510, command: Command) -> Result<()> {
    match command {
        Command::Identify => {
            println!("state: {:?}", dmm.state());
            println!("sense prefix: {}", dmm.sense_prefix());
        }
        Command::Read => {
            let value = dmm.read().await?;
            println!("{value:.9}");
        }
        Command::Stats => {
            let stats = dmm.statistics().await?;
            println!("average: {:.6e}", stats.average);
            println!("peak-to-peak: {:.6e}", stats.peak_to_peak);
            println!("std dev: {:.6e}", stats.std_dev);
            println!("span: {}", stats.span);
            println!("min: {:.6e}", stats.min);
            println!("max: {:.6e}", stats.max);
        }
        Command::Status => {
            println!("{}", dmm.trigger_status().await?);
        }
        Command::Mode { set: Some(mode) } => {
            dmm.set_measurement_mode(mode.into()).await?;
        }
        Command::Mode { set: None } => match dmm.resolve_mode().await? {
            Some(mode) => println!("{mode}"),
            None => println!("unknown"),
        },
        Command::Range { set: Some(value) } => {
            dmm.set_range(value).await?;
        }
        Command::Range { set: None } => {
            println!("{:.3e}", dmm.range().await?);
        }
        Command::TriggerDuration { duration } => {
            dmm.trigger_duration_loop(duration).await?;
        }
        Command::TriggerExternal { cycles } => {
            dmm.trigger_external(cycles).await?;
        }
        Command::Init => dmm.initiate().await?,
        Command::Abort => dmm.abort().await?,
        Command::Continuous => dmm.continuous().await?,
        Command::ClearStats => dmm.clear_statistics().await?,
        Command::ClearTrace => dmm.clear_trace().await?,
    }
    Ok(())
}
