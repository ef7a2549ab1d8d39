use crossterm::style::Color;
use panelmon_core::{MetricKind, Theme};

/// Color scheme for the indicator
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub background: Color,
    pub foreground: Color,
    pub accent: Color,
    pub border: Color,
    pub highlight: Color,
    pub warning: Color,
    pub error: Color,
    pub success: Color,
    pub muted: Color,
    pub panel_bg: Color,
}

impl ColorScheme {
    pub fn new(theme: &Theme, no_color: bool) -> Self {
        if no_color {
            Self::no_color()
        } else {
            match theme {
                Theme::Dark => Self::dark(),
                Theme::Light => Self::light(),
            }
        }
    }

    fn dark() -> Self {
        Self {
            background: Color::Black,
            foreground: Color::White,
            accent: Color::Cyan,
            border: Color::DarkGrey,
            highlight: Color::Yellow,
            warning: Color::DarkYellow,
            error: Color::Red,
            success: Color::Green,
            muted: Color::DarkGrey,
            panel_bg: Color::DarkBlue,
        }
    }

    fn light() -> Self {
        Self {
            background: Color::White,
            foreground: Color::Black,
            accent: Color::Blue,
            border: Color::Grey,
            highlight: Color::DarkBlue,
            warning: Color::DarkYellow,
            error: Color::DarkRed,
            success: Color::DarkGreen,
            muted: Color::Grey,
            panel_bg: Color::Grey,
        }
    }

    fn no_color() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::Reset,
            accent: Color::Reset,
            border: Color::Reset,
            highlight: Color::Reset,
            warning: Color::Reset,
            error: Color::Reset,
            success: Color::Reset,
            muted: Color::Reset,
            panel_bg: Color::Reset,
        }
    }

    /// Get color for a usage percentage of `kind`; unavailable is muted
    pub fn usage_color(&self, kind: MetricKind, percent: Option<f64>) -> Color {
        let Some(usage) = percent else {
            return self.muted;
        };

        // memory and disk run high for long stretches, so warn later
        let warn_at = match kind {
            MetricKind::Memory | MetricKind::Disk => 80.0,
            _ => 70.0,
        };

        if usage > 90.0 {
            self.error
        } else if usage > warn_at {
            self.warning
        } else {
            self.success
        }
    }
}
