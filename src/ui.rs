//! Live single-line status display

use crate::status::{MaskingStatus, StatusSink};
use ratatui::{
    backend::CrosstermBackend,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Terminal, TerminalOptions, Viewport,
};
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

/// Create a gradient bar showing the masking level
pub fn create_level_bar(width: usize, ratio: f64) -> Vec<Span<'static>> {
    let ratio = ratio.clamp(0.0, 1.0);
    let filled = (ratio * width as f64) as usize;
    let partial_fill = (ratio * width as f64) - filled as f64;
    let mut spans = Vec::with_capacity(width);

    for i in 0..width {
        let color = if i < width / 3 {
            Color::Green
        } else if i < 2 * width / 3 {
            Color::Yellow
        } else {
            Color::Red
        };

        let ch = if i < filled {
            '█'
        } else if i == filled && partial_fill > 0.0 {
            match (partial_fill * 8.0) as usize {
                0..=1 => '░',
                2..=3 => '▒',
                4..=5 => '▓',
                _ => '█',
            }
        } else {
            '░'
        };
        spans.push(Span::styled(ch.to_string(), Style::default().fg(color)));
    }

    spans
}

/// Build the colored status line for one record
pub fn status_line(status: &MaskingStatus) -> Line<'static> {
    let label_style = if status.is_masking_active {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Green)
    };

    let mut spans = vec![
        Span::styled(status.label(), label_style),
        Span::raw(format!(" | Room Noise: {:.4} | Masking Level: ", status.noise_metric)),
    ];
    spans.extend(create_level_bar(
        crate::constants::ui::LEVEL_BAR_WIDTH,
        status.commanded_volume as f64,
    ));
    spans.push(Span::raw(format!(" {}%", status.volume_percent())));

    Line::from(spans)
}

/// Inline ratatui viewport redrawn in place, at most once per update interval
pub struct InlineDisplay {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    last_draw: Option<Instant>,
    pending: Option<MaskingStatus>,
    interval: Duration,
}

impl InlineDisplay {
    pub fn new() -> io::Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Inline(1),
            },
        )?;

        Ok(Self {
            terminal: Some(terminal),
            last_draw: None,
            pending: None,
            interval: Duration::from_millis(crate::constants::ui::UPDATE_INTERVAL_MS),
        })
    }

    fn draw_pending(&mut self) {
        let (Some(terminal), Some(status)) = (self.terminal.as_mut(), self.pending.take()) else {
            return;
        };

        let result = terminal
            .draw(|f| {
                f.render_widget(Paragraph::new(status_line(&status)), f.size());
            })
            .map(|_| ());

        match result {
            Ok(()) => self.last_draw = Some(Instant::now()),
            Err(e) => {
                tracing::warn!("status display disabled: {}", e);
                self.terminal = None;
            }
        }
    }
}

impl StatusSink for InlineDisplay {
    fn publish(&mut self, status: &MaskingStatus) {
        self.pending = Some(*status);
        let due = self
            .last_draw
            .is_none_or(|at| at.elapsed() >= self.interval);
        if due {
            self.draw_pending();
        }
    }

    fn finish(&mut self) {
        self.draw_pending();
        if let Some(mut terminal) = self.terminal.take() {
            let _ = terminal.show_cursor();
            let mut stdout = io::stdout();
            let _ = writeln!(stdout);
            let _ = stdout.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_text(spans: &[Span<'_>]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_level_bar_width_and_fill() {
        let spans = create_level_bar(20, 0.5);
        assert_eq!(spans.len(), 20);
        let text = bar_text(&spans);
        assert_eq!(text.chars().filter(|&c| c == '█').count(), 10);
    }

    #[test]
    fn test_level_bar_partial_cell() {
        let text = bar_text(&create_level_bar(10, 0.25));
        let cells: Vec<char> = text.chars().collect();
        assert_eq!(cells[1], '█');
        assert_eq!(cells[2], '▓');
        assert_eq!(cells[3], '░');
    }

    #[test]
    fn test_level_bar_clamps_ratio() {
        assert_eq!(bar_text(&create_level_bar(5, 2.0)), "█████");
        assert_eq!(bar_text(&create_level_bar(5, -1.0)), "░░░░░");
    }

    #[test]
    fn test_status_line_matches_plain_format() {
        let status = MaskingStatus {
            is_masking_active: false,
            noise_metric: 0.0042,
            commanded_volume: 0.2,
        };
        let text: String = status_line(&status)
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(text.starts_with("ROOM QUIET"));
        assert!(text.contains("Room Noise: 0.0042"));
        assert!(text.ends_with(" 20%"));
    }
}
