//! Application constants and configuration values

/// Audio capture constants
pub mod audio {
    /// Preferred capture sample rate
    pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
    /// Samples per analysed block
    pub const DEFAULT_BLOCK_SIZE: usize = 1024;
    /// Preferred number of capture channels
    pub const DEFAULT_CHANNELS: u16 = 1;
    /// Buffer size for audio streams
    pub const BUFFER_SIZE: cpal::BufferSize = cpal::BufferSize::Default;
}

/// Volume controller defaults
pub mod masking {
    /// Default masking sound file
    pub const DEFAULT_SOUND_FILE: &str = "rain.mp3";
    /// RMS above which the room counts as noisy (lower = more sensitive)
    pub const DEFAULT_SENSITIVITY: f32 = 0.015;
    /// Volume held while the room is quiet
    pub const DEFAULT_BASE_VOLUME: f32 = 0.2;
    /// Volume approached while the room is noisy
    pub const DEFAULT_MAX_VOLUME: f32 = 1.0;
    /// Fraction of the remaining distance covered per block (lower = slower fade)
    pub const DEFAULT_SMOOTHING_FACTOR: f32 = 0.05;
}

/// UI display constants
pub mod ui {
    /// Minimum time between two status line redraws, in milliseconds
    pub const UPDATE_INTERVAL_MS: u64 = 50;
    /// Number of cells in the masking level bar
    pub const LEVEL_BAR_WIDTH: usize = 20;
}
