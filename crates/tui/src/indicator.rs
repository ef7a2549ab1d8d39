use crate::format::{format_panel_value, format_percent, format_rate, NOT_AVAILABLE};
use panelmon_core::{MetricKind, Snapshot};

const CPU_SYMBOL: &str = "💻";
const GPU_SYMBOL: &str = "🎞";
const MEMORY_SYMBOL: &str = "🧠";
const DISK_SYMBOL: &str = "💾";
const NET_SYMBOL: &str = "🌐";

const SEPARATOR: &str = "  |  ";

/// One row of the dropdown summary
#[derive(Debug, Clone, PartialEq)]
pub struct MenuLine {
    pub kind: MetricKind,
    pub text: String,
    /// Percentage shown on the line, for severity coloring
    pub percent: Option<f64>,
}

/// Text rendering of a snapshot: the panel label and the dropdown rows
#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorView {
    /// Plain ASCII tags instead of emoji symbols
    pub ascii: bool,
}

impl IndicatorView {
    pub fn new(ascii: bool) -> Self {
        Self { ascii }
    }

    fn symbol(&self, kind: MetricKind) -> &'static str {
        if self.ascii {
            return match kind {
                MetricKind::Cpu => "CPU",
                MetricKind::Gpu => "GPU",
                MetricKind::Memory => "MEM",
                MetricKind::Disk => "DSK",
                MetricKind::NetDown | MetricKind::NetUp => "NET",
            };
        }
        match kind {
            MetricKind::Cpu => CPU_SYMBOL,
            MetricKind::Gpu => GPU_SYMBOL,
            MetricKind::Memory => MEMORY_SYMBOL,
            MetricKind::Disk => DISK_SYMBOL,
            MetricKind::NetDown | MetricKind::NetUp => NET_SYMBOL,
        }
    }

    /// Compact label for the panel: CPU, GPU and network throughput.
    ///
    /// Sections for metrics that are switched off are left out.
    pub fn panel_label(&self, snapshot: &Snapshot) -> String {
        let mut sections = Vec::new();

        for kind in [MetricKind::Cpu, MetricKind::Gpu] {
            if snapshot.is_enabled(kind) {
                sections.push(format!(
                    "{} {}",
                    self.symbol(kind),
                    format_panel_value(kind, snapshot.get(kind))
                ));
            }
        }

        let down = snapshot.is_enabled(MetricKind::NetDown);
        let up = snapshot.is_enabled(MetricKind::NetUp);
        if down || up {
            let mut net = self.symbol(MetricKind::NetDown).to_string();
            if down {
                net.push_str(&format!(
                    " ↓{}",
                    format_panel_value(MetricKind::NetDown, snapshot.get(MetricKind::NetDown))
                ));
            }
            if up {
                net.push_str(&format!(
                    " ↑{}",
                    format_panel_value(MetricKind::NetUp, snapshot.get(MetricKind::NetUp))
                ));
            }
            sections.push(net);
        }

        sections.join(SEPARATOR)
    }

    /// Dropdown rows: one per enabled metric, network directions merged
    pub fn menu_lines(&self, snapshot: &Snapshot) -> Vec<MenuLine> {
        let mut lines = Vec::new();

        for kind in [MetricKind::Cpu, MetricKind::Gpu, MetricKind::Memory, MetricKind::Disk] {
            if !snapshot.is_enabled(kind) {
                continue;
            }
            let percent = snapshot.value(kind);
            let value = percent.map(format_percent).unwrap_or_else(|| NOT_AVAILABLE.to_string());
            lines.push(MenuLine {
                kind,
                text: format!("{} {}: {}", self.symbol(kind), kind.label(), value.trim_start()),
                percent,
            });
        }

        let rate = |kind: MetricKind| {
            snapshot
                .value(kind)
                .map(format_rate)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        let mut net = Vec::new();
        if snapshot.is_enabled(MetricKind::NetDown) {
            net.push(format!("↓ {}", rate(MetricKind::NetDown)));
        }
        if snapshot.is_enabled(MetricKind::NetUp) {
            net.push(format!("↑ {}", rate(MetricKind::NetUp)));
        }
        if !net.is_empty() {
            lines.push(MenuLine {
                kind: MetricKind::NetDown,
                text: format!("{} Network: {}", self.symbol(MetricKind::NetDown), net.join(" ")),
                percent: None,
            });
        }

        lines
    }
}
