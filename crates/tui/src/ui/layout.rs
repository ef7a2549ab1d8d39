/// Rectangle for layout calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_terminal_size() -> anyhow::Result<Self> {
        let (width, height) = crossterm::terminal::size()?;
        Ok(Self::new(0, 0, width, height))
    }

    pub fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    pub fn area(&self) -> u16 {
        self.width.saturating_mul(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn inner(&self, margin: u16) -> Self {
        let doubled_margin = margin.saturating_mul(2);
        Self {
            x: self.x.saturating_add(margin),
            y: self.y.saturating_add(margin),
            width: self.width.saturating_sub(doubled_margin),
            height: self.height.saturating_sub(doubled_margin),
        }
    }
}

/// Screen areas of the indicator
#[derive(Debug, Clone, Copy)]
pub struct MainLayout {
    /// Panel label, first row
    pub panel: Rect,
    /// Dropdown anchored under the right end of the panel
    pub dropdown: Rect,
    /// Key hints, last row
    pub footer: Rect,
}

/// Layout manager for the indicator
pub struct Layout {
    terminal_rect: Rect,
}

impl Layout {
    pub const DROPDOWN_WIDTH: u16 = 44;

    pub fn new() -> anyhow::Result<Self> {
        let terminal_rect = Rect::from_terminal_size()?;
        Ok(Self { terminal_rect })
    }

    pub fn with_size(width: u16, height: u16) -> Self {
        Self {
            terminal_rect: Rect::new(0, 0, width, height),
        }
    }

    pub fn update_terminal_size(&mut self) -> anyhow::Result<()> {
        self.terminal_rect = Rect::from_terminal_size()?;
        Ok(())
    }

    pub fn terminal_rect(&self) -> Rect {
        self.terminal_rect
    }

    /// Calculate layout for a dropdown of `menu_rows` rows
    pub fn main_layout(&self, menu_rows: u16) -> MainLayout {
        let rect = self.terminal_rect;

        let panel = Rect::new(rect.x, rect.y, rect.width, rect.height.min(1));
        let footer = Rect::new(
            rect.x,
            rect.bottom().saturating_sub(1),
            rect.width,
            rect.height.saturating_sub(1).min(1),
        );

        // rows plus border, kept clear of panel and footer
        let width = Self::DROPDOWN_WIDTH.min(rect.width);
        let height = menu_rows
            .saturating_add(2)
            .min(rect.height.saturating_sub(2));
        let dropdown = Rect::new(rect.right().saturating_sub(width), rect.y + 1, width, height);

        MainLayout {
            panel,
            dropdown,
            footer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropdown_anchored_right() {
        let layout = Layout::with_size(100, 30).main_layout(8);
        assert_eq!(layout.panel, Rect::new(0, 0, 100, 1));
        assert_eq!(layout.footer, Rect::new(0, 29, 100, 1));
        assert_eq!(layout.dropdown, Rect::new(56, 1, 44, 10));
    }

    #[test]
    fn test_small_terminal() {
        let layout = Layout::with_size(20, 5).main_layout(8);
        assert_eq!(layout.dropdown.width, 20);
        assert_eq!(layout.dropdown.height, 3);
        assert!(layout.dropdown.bottom() <= layout.footer.y);
    }
}
