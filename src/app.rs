//! Main application logic and orchestration

use crate::audio::{self, CaptureEvent};
use crate::config::{Config, DisplayMode};
use crate::controller::Controller;
use crate::error::{AppError, AppResult};
use crate::playback::{MaskingPlayer, VolumeSink};
use crate::status::{NullStatus, PlainDisplay, StatusSink};
use crate::ui::InlineDisplay;
use cpal::traits::StreamTrait;
use crossterm::tty::IsTty;
use std::future::Future;
use std::io;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Exit codes for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Error = 1,  // Startup or capture failure
    Config = 2, // Invalid command line values
}

/// Why the control loop stopped
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Interrupt signal received
    Interrupted,
    /// The interrupt handler could not be installed
    SignalFailed(String),
    /// The capture stream reported an error
    CaptureFailed(String),
    /// The capture side hung up without an error
    CaptureClosed,
}

/// Main application struct
pub struct App {
    config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        App { config }
    }

    /// Run until interrupted; returns the process exit code
    pub async fn run(self) -> AppResult<ExitCode> {
        let settings = self.config.controller;

        // No capture without a playable masking source
        let player = MaskingPlayer::open(&self.config.sound_file, settings.base_volume())?;

        let (device, audio_config) =
            audio::setup_audio_device(self.config.device_name.as_deref(), self.config.sample_rate)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let stream = audio::build_capture_stream(&device, &audio_config, self.config.block_size, tx)?;
        stream.play()?;

        tracing::info!(
            device = %audio_config.device_name,
            sample_rate = audio_config.sample_rate,
            channels = audio_config.channels,
            block_size = self.config.block_size,
            period_ms = self.config.block_period_secs() * 1000.0,
            "capture started"
        );

        println!("--- noisemask ---");
        println!("Playing: {}", self.config.sound_file.display());
        println!("Listening on: {}", audio_config.device_name);
        println!("Adjust --sensitivity if the masking triggers too easily or not at all.");
        println!("Press Ctrl+C to stop.");

        let mut display = open_display(self.config.display);
        let mut controller = Controller::new(settings);
        tracing::info!(
            sensitivity = settings.sensitivity_threshold(),
            base_volume = settings.base_volume(),
            max_volume = settings.max_volume(),
            smoothing = settings.smoothing_factor(),
            "volume controller ready"
        );

        let reason = control_loop(
            &mut controller,
            rx,
            &player,
            display.as_mut(),
            tokio::signal::ctrl_c(),
        )
        .await;

        tracing::debug!(
            ?reason,
            final_volume = controller.state().current_volume(),
            "control loop stopped"
        );

        // Stop capture before tearing down the display and playback
        drop(stream);
        display.finish();
        player.stop();

        match reason {
            StopReason::Interrupted => {
                println!("Stopping noisemask...");
                Ok(ExitCode::Success)
            }
            StopReason::SignalFailed(msg) => Err(AppError::Signal(msg)),
            StopReason::CaptureFailed(msg) => Err(AppError::AudioStream(msg)),
            StopReason::CaptureClosed => {
                Err(AppError::AudioStream("capture stream closed unexpectedly".to_string()))
            }
        }
    }
}

/// The colored inline display needs a terminal; anything else gets plain text
pub fn effective_display(mode: DisplayMode, stdout_is_tty: bool) -> DisplayMode {
    match mode {
        DisplayMode::Inline if !stdout_is_tty => DisplayMode::Plain,
        other => other,
    }
}

fn open_display(mode: DisplayMode) -> Box<dyn StatusSink> {
    match effective_display(mode, io::stdout().is_tty()) {
        DisplayMode::Inline => match InlineDisplay::new() {
            Ok(display) => Box::new(display),
            Err(e) => {
                tracing::warn!("inline display unavailable, falling back to plain: {}", e);
                Box::new(PlainDisplay::new(std::io::stdout()))
            }
        },
        DisplayMode::Plain => Box::new(PlainDisplay::new(std::io::stdout())),
        DisplayMode::Off => Box::new(NullStatus),
    }
}

/// Feed captured blocks through the controller, in order, until `shutdown`
/// resolves or capture ends.
pub async fn control_loop<V, S, F>(
    controller: &mut Controller,
    mut blocks: UnboundedReceiver<CaptureEvent>,
    volume: &V,
    status: &mut S,
    shutdown: F,
) -> StopReason
where
    V: VolumeSink + ?Sized,
    S: StatusSink + ?Sized,
    F: Future<Output = io::Result<()>>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            signal = &mut shutdown => return match signal {
                Ok(()) => StopReason::Interrupted,
                Err(e) => StopReason::SignalFailed(e.to_string()),
            },
            event = blocks.recv() => match event {
                Some(CaptureEvent::Block(block)) => {
                    controller.process_block(&block, volume, status);
                }
                Some(CaptureEvent::Failed(msg)) => return StopReason::CaptureFailed(msg),
                None => return StopReason::CaptureClosed,
            },
        }
    }
}
