use crate::ui::{ColorScheme, Rect};
use crossterm::{
    cursor,
    style::{Print, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::{self, Write};

const HELP_LINES: [&str; 13] = [
    "                PANELMON HELP",
    "",
    "Menu:",
    "  m, Enter         Open/close the dropdown summary",
    "",
    "Preferences:",
    "  1, 2, 5          Update every 1, 2 or 5 seconds",
    "",
    "Other:",
    "  ?                Show this help",
    "  q, Esc, Ctrl+C   Quit",
    "",
    "N/A: metric unavailable (utility missing, denied)",
];

/// Help overlay widget
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render<W: Write>(
        &self,
        writer: &mut W,
        area: Rect,
        colors: &ColorScheme,
    ) -> io::Result<()> {
        if area.width < 8 || area.height < 6 {
            return Ok(());
        }

        let popup_width = 56.min(area.width - 4);
        let popup_height = (HELP_LINES.len() as u16 + 2).min(area.height - 4);
        let popup_x = area.x + (area.width - popup_width) / 2;
        let popup_y = area.y + (area.height - popup_height) / 2;
        let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

        for y in popup_area.y..popup_area.bottom() {
            writer.queue(cursor::MoveTo(popup_area.x, y))?;
            writer.queue(SetBackgroundColor(colors.background))?;
            writer.queue(Print(" ".repeat(popup_area.width as usize)))?;
        }

        self.render_border(writer, popup_area, colors)?;

        let content_area = popup_area.inner(1);
        for (i, line) in HELP_LINES.iter().enumerate() {
            if i >= content_area.height as usize {
                break;
            }

            writer.queue(cursor::MoveTo(content_area.x, content_area.y + i as u16))?;

            if i == 0 {
                writer.queue(SetForegroundColor(colors.accent))?;
            } else if line.ends_with(':') {
                writer.queue(SetForegroundColor(colors.highlight))?;
            } else {
                writer.queue(SetForegroundColor(colors.foreground))?;
            }

            let truncated: String = line.chars().take(content_area.width as usize).collect();
            writer.queue(Print(truncated))?;
        }

        Ok(())
    }

    fn render_border<W: Write>(
        &self,
        writer: &mut W,
        area: Rect,
        colors: &ColorScheme,
    ) -> io::Result<()> {
        writer.queue(SetForegroundColor(colors.border))?;
        writer.queue(SetBackgroundColor(colors.background))?;

        writer.queue(cursor::MoveTo(area.x, area.y))?;
        writer.queue(Print("┌"))?;
        writer.queue(Print("─".repeat(area.width as usize - 2)))?;
        writer.queue(Print("┐"))?;

        for y in area.y + 1..area.bottom() - 1 {
            writer.queue(cursor::MoveTo(area.x, y))?;
            writer.queue(Print("│"))?;
            writer.queue(cursor::MoveTo(area.right() - 1, y))?;
            writer.queue(Print("│"))?;
        }

        writer.queue(cursor::MoveTo(area.x, area.bottom() - 1))?;
        writer.queue(Print("└"))?;
        writer.queue(Print("─".repeat(area.width as usize - 2)))?;
        writer.queue(Print("┘"))?;

        Ok(())
    }
}
