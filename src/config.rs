//! Configuration parsing and validation

use crate::constants::{audio, masking};
use crate::controller::ControllerSettings;
use crate::error::ConfigError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command line arguments for the noisemask application
#[derive(Parser)]
#[command(name = "noisemask")]
#[command(about = "Adaptive noise masking driven by ambient microphone levels")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play the masking sound and follow the room noise until Ctrl+C
    Run(RunArgs),
    /// List available audio input devices
    List(ListArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Masking sound file, played in a loop
    #[arg(long, default_value = masking::DEFAULT_SOUND_FILE)]
    pub sound: PathBuf,

    /// Noise RMS above which masking kicks in (lower = more sensitive)
    #[arg(long, default_value_t = masking::DEFAULT_SENSITIVITY)]
    pub sensitivity: f32,

    /// Volume while the room is quiet (0.0 to 1.0)
    #[arg(long, default_value_t = masking::DEFAULT_BASE_VOLUME)]
    pub base_volume: f32,

    /// Volume approached while the room is noisy (0.0 to 1.0)
    #[arg(long, default_value_t = masking::DEFAULT_MAX_VOLUME)]
    pub max_volume: f32,

    /// Fraction of the gap to the target closed per block (lower = slower fade)
    #[arg(long, default_value_t = masking::DEFAULT_SMOOTHING_FACTOR)]
    pub smoothing: f32,

    /// Samples per analysed block
    #[arg(long, default_value_t = audio::DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// Capture sample rate in Hz
    #[arg(long, default_value_t = audio::DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Audio input device name (optional, uses default if not specified)
    #[arg(long)]
    pub device: Option<String>,

    /// Print the status line as plain text instead of the colored display
    #[arg(long, conflicts_with = "quiet")]
    pub plain: bool,

    /// Do not print the status line
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Parser)]
pub struct ListArgs {}

/// How the per-block status is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Inline,
    Plain,
    Off,
}

/// Application configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct Config {
    pub sound_file: PathBuf,
    pub controller: ControllerSettings,
    pub block_size: usize,
    pub sample_rate: u32,
    pub device_name: Option<String>,
    pub display: DisplayMode,
}

impl Config {
    /// Create configuration from run arguments
    pub fn from_run_args(args: RunArgs) -> Result<Self, ConfigError> {
        let controller = ControllerSettings::new(
            args.sensitivity,
            args.base_volume,
            args.max_volume,
            args.smoothing,
        )?;

        if args.block_size == 0 {
            return Err(ConfigError::BlockSize);
        }
        if args.sample_rate == 0 {
            return Err(ConfigError::SampleRate);
        }

        let display = if args.quiet {
            DisplayMode::Off
        } else if args.plain {
            DisplayMode::Plain
        } else {
            DisplayMode::Inline
        };

        Ok(Config {
            sound_file: args.sound,
            controller,
            block_size: args.block_size,
            sample_rate: args.sample_rate,
            device_name: args.device,
            display,
        })
    }

    /// Duration of one block in seconds at the configured rate
    pub fn block_period_secs(&self) -> f64 {
        self.block_size as f64 / self.sample_rate as f64
    }
}
