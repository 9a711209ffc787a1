//! Per-block status records and the sinks that display them

use std::io::Write;

/// What the controller did with one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskingStatus {
    pub is_masking_active: bool,
    pub noise_metric: f32,
    pub commanded_volume: f32,
}

impl MaskingStatus {
    /// Short label shown at the start of the status line
    pub fn label(&self) -> &'static str {
        if self.is_masking_active {
            "MASKING ACTIVE"
        } else {
            "ROOM QUIET    "
        }
    }

    /// Volume as a whole percentage, truncated
    pub fn volume_percent(&self) -> u32 {
        (self.commanded_volume.clamp(0.0, 1.0) * 100.0) as u32
    }

    /// Number of filled cells in a level bar of `width` cells
    pub fn filled_cells(&self, width: usize) -> usize {
        ((self.commanded_volume.clamp(0.0, 1.0) * width as f32) as usize).min(width)
    }
}

/// Receives one status record per processed block.
///
/// Implementations must not block the control loop; anything slow should be
/// rate-limited or dropped.
pub trait StatusSink {
    fn publish(&mut self, status: &MaskingStatus);

    /// Called once on shutdown
    fn finish(&mut self) {}
}

/// Discards every record (`--quiet`)
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn publish(&mut self, _status: &MaskingStatus) {}
}

/// Render the status line as plain text
pub fn format_status_line(status: &MaskingStatus) -> String {
    let width = crate::constants::ui::LEVEL_BAR_WIDTH;
    let bar = "█".repeat(status.filled_cells(width));
    format!(
        "{} | Room Noise: {:.4} | Masking Level: {:<width$} {}%",
        status.label(),
        status.noise_metric,
        bar,
        status.volume_percent(),
        width = width,
    )
}

/// Overwrites a single line on any writer with carriage returns (`--plain`)
pub struct PlainDisplay<W: Write> {
    out: W,
    failed: bool,
}

impl<W: Write> PlainDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out, failed: false }
    }
}

impl<W: Write> StatusSink for PlainDisplay<W> {
    fn publish(&mut self, status: &MaskingStatus) {
        if self.failed {
            return;
        }
        let line = format_status_line(status);
        if let Err(e) = write!(self.out, "\r{}", line).and_then(|_| self.out.flush()) {
            tracing::warn!("status display disabled: {}", e);
            self.failed = true;
        }
    }

    fn finish(&mut self) {
        if !self.failed {
            let _ = writeln!(self.out);
        }
    }
}
