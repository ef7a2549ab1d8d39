use crate::{
    indicator::MenuLine,
    ui::{ColorScheme, Rect},
};
use crossterm::{
    cursor,
    style::{Print, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use panelmon_core::ALLOWED_INTERVALS;
use std::io::{self, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Longest prefix of `text` that fits in `width` terminal columns
fn take_columns(text: &str, width: usize) -> (String, usize) {
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
    }
    (out, used)
}

/// Cut `text` to `width` terminal columns, padding when shorter
fn fit(text: &str, width: usize) -> String {
    let columns = text.width();
    if columns <= width {
        return format!("{}{}", text, " ".repeat(width - columns));
    }

    let (mut cut, mut used) = take_columns(text, width.saturating_sub(3));
    let dots = (width - used).min(3);
    cut.push_str(&".".repeat(dots));
    used += dots;
    format!("{}{}", cut, " ".repeat(width - used))
}

/// The always-visible indicator label
pub struct PanelBar;

impl PanelBar {
    pub fn render<W: Write>(
        &self,
        writer: &mut W,
        area: Rect,
        label: &str,
        menu_open: bool,
        colors: &ColorScheme,
    ) -> io::Result<()> {
        if area.is_empty() {
            return Ok(());
        }

        writer.queue(cursor::MoveTo(area.x, area.y))?;
        writer.queue(SetBackgroundColor(colors.panel_bg))?;
        writer.queue(SetForegroundColor(colors.foreground))?;

        let arrow = if menu_open { "▴" } else { "▾" };
        let content = format!(" {} {}", label, arrow);

        // right-aligned, like a tray entry
        let width = area.width as usize;
        let columns = content.width();
        let line = if columns >= width {
            fit(&content, width)
        } else {
            format!("{}{}", " ".repeat(width - columns), content)
        };
        writer.queue(Print(line))?;
        writer.queue(SetBackgroundColor(colors.background))?;
        Ok(())
    }
}

/// Dropdown summary with the interval preference and quit entry
pub struct Dropdown;

impl Dropdown {
    pub fn rows(lines: &[MenuLine]) -> u16 {
        // metrics, separator, interval, quit
        lines.len() as u16 + 3
    }

    pub fn render<W: Write>(
        &self,
        writer: &mut W,
        area: Rect,
        lines: &[MenuLine],
        interval_secs: u32,
        colors: &ColorScheme,
    ) -> io::Result<()> {
        if area.height < 3 || area.width < 4 {
            return Ok(());
        }

        draw_box(writer, area, colors)?;
        let content = area.inner(1);
        let width = content.width as usize;
        let mut row = content.y;

        for line in lines {
            if row >= content.bottom() {
                return Ok(());
            }
            writer.queue(cursor::MoveTo(content.x, row))?;
            writer.queue(SetForegroundColor(colors.usage_color(line.kind, line.percent)))?;
            writer.queue(Print(fit(&line.text, width)))?;
            row += 1;
        }

        let preferences = [
            "─".repeat(width),
            interval_choices(interval_secs),
            "Quit (q)".to_string(),
        ];
        for (i, text) in preferences.iter().enumerate() {
            if row >= content.bottom() {
                break;
            }
            writer.queue(cursor::MoveTo(content.x, row))?;
            let color = if i == 0 { colors.border } else { colors.foreground };
            writer.queue(SetForegroundColor(color))?;
            writer.queue(Print(fit(text, width)))?;
            row += 1;
        }

        Ok(())
    }
}

/// `Interval: (•) 1s  ( ) 2s  ( ) 5s`
pub fn interval_choices(current: u32) -> String {
    let choices: Vec<String> = ALLOWED_INTERVALS
        .iter()
        .map(|secs| {
            let mark = if *secs == current { '•' } else { ' ' };
            format!("({}) {}s", mark, secs)
        })
        .collect();
    format!("Interval: {}", choices.join("  "))
}

fn draw_box<W: Write>(writer: &mut W, area: Rect, colors: &ColorScheme) -> io::Result<()> {
    writer.queue(SetForegroundColor(colors.border))?;
    writer.queue(SetBackgroundColor(colors.background))?;

    let inner = area.width as usize - 2;
    writer.queue(cursor::MoveTo(area.x, area.y))?;
    writer.queue(Print(format!("┌{}┐", "─".repeat(inner))))?;

    for y in area.y + 1..area.bottom() - 1 {
        writer.queue(cursor::MoveTo(area.x, y))?;
        writer.queue(Print(format!("│{}│", " ".repeat(inner))))?;
    }

    writer.queue(cursor::MoveTo(area.x, area.bottom() - 1))?;
    writer.queue(Print(format!("└{}┘", "─".repeat(inner))))?;
    Ok(())
}

/// Footer widget for keybind hints
pub struct Footer;

impl Footer {
    pub fn render<W: Write>(
        &self,
        writer: &mut W,
        area: Rect,
        status: &str,
        colors: &ColorScheme,
    ) -> io::Result<()> {
        if area.is_empty() {
            return Ok(());
        }

        writer.queue(cursor::MoveTo(area.x, area.y))?;
        writer.queue(SetForegroundColor(colors.muted))?;
        writer.queue(SetBackgroundColor(colors.background))?;

        let keybinds = format!("q:quit m:menu 1/2/5:interval ?:help  {}", status);
        writer.queue(Print(fit(&keybinds, area.width as usize)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdefgh", 6), "abc...");
        assert_eq!(fit("↓↑", 3), "↓↑ ");
    }

    #[test]
    fn test_fit_counts_wide_symbols_as_two_columns() {
        // 💻 takes two columns
        assert_eq!(fit("💻 1", 6), "💻 1  ");
        assert_eq!(fit("💻 1", 6).width(), 6);
        assert_eq!(fit("💻💻💻💻", 5), "💻...");
        assert_eq!(fit("💻💻💻💻", 6).width(), 6);
    }

    #[test]
    fn test_panel_bar_fills_exactly_its_width() {
        let colors = ColorScheme::new(&panelmon_core::Theme::Dark, true);
        let mut buffer = Vec::new();
        PanelBar
            .render(&mut buffer, Rect::new(0, 0, 20, 1), "💻  1.0%", false, &colors)
            .unwrap();
        let output = String::from_utf8_lossy(&buffer);
        // 9 columns of padding, then the 11-column " 💻  1.0% ▾"
        let padded = format!("{}💻  1.0% ▾", " ".repeat(10));
        assert!(output.contains(&padded));
        assert!(!output.contains(&format!("{}💻", " ".repeat(11))));
    }

    #[test]
    fn test_interval_choices() {
        assert_eq!(interval_choices(2), "Interval: ( ) 1s  (•) 2s  ( ) 5s");
    }

    #[test]
    fn test_dropdown_renders_into_buffer() {
        let colors = ColorScheme::new(&panelmon_core::Theme::Dark, true);
        let lines = vec![MenuLine {
            kind: panelmon_core::MetricKind::Cpu,
            text: "CPU: 12.0%".to_string(),
            percent: Some(12.0),
        }];
        let mut buffer = Vec::new();
        Dropdown
            .render(&mut buffer, Rect::new(0, 1, 40, 6), &lines, 5, &colors)
            .unwrap();
        let output = String::from_utf8_lossy(&buffer);
        assert!(output.contains("CPU: 12.0%"));
        assert!(output.contains("(•) 5s"));
    }
}
