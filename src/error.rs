//! Custom error types for the application

use thiserror::Error;

/// Invalid command line configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sensitivity must be a positive number, got {0}")]
    Sensitivity(f32),

    #[error("{name} must be between 0.0 and 1.0, got {value}")]
    VolumeRange { name: &'static str, value: f32 },

    #[error("base volume ({base}) must not exceed max volume ({max})")]
    VolumeOrder { base: f32, max: f32 },

    #[error("smoothing factor must be in (0.0, 1.0], got {0}")]
    Smoothing(f32),

    #[error("block size must be positive")]
    BlockSize,

    #[error("sample rate must be positive")]
    SampleRate,
}

/// Application-specific error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The masking sound could not be opened or decoded
    #[error("Cannot load masking sound {path}: {reason}")]
    MaskingSource { path: String, reason: String },

    /// Output device or sink errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// Audio device related errors
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Audio stream related errors
    #[error("Audio stream error: {0}")]
    AudioStream(String),

    /// Interrupt handler could not be installed
    #[error("Signal handling error: {0}")]
    Signal(String),
}

impl From<cpal::DevicesError> for AppError {
    fn from(err: cpal::DevicesError) -> Self {
        AppError::AudioDevice(format!("Failed to enumerate devices: {}", err))
    }
}

impl From<cpal::DeviceNameError> for AppError {
    fn from(err: cpal::DeviceNameError) -> Self {
        AppError::AudioDevice(format!("Failed to get device name: {}", err))
    }
}

impl From<cpal::SupportedStreamConfigsError> for AppError {
    fn from(err: cpal::SupportedStreamConfigsError) -> Self {
        AppError::AudioDevice(format!("Failed to get supported stream configs: {}", err))
    }
}

impl From<cpal::BuildStreamError> for AppError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AppError::AudioStream(format!("Failed to build audio stream: {}", err))
    }
}

impl From<cpal::PlayStreamError> for AppError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AppError::AudioStream(format!("Failed to play audio stream: {}", err))
    }
}

impl From<rodio::StreamError> for AppError {
    fn from(err: rodio::StreamError) -> Self {
        AppError::Playback(format!("Failed to open output device: {}", err))
    }
}

impl From<rodio::PlayError> for AppError {
    fn from(err: rodio::PlayError) -> Self {
        AppError::Playback(format!("Failed to create playback sink: {}", err))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
