use crate::{
    indicator::IndicatorView,
    ui::{ColorScheme, Dropdown, Footer, HelpOverlay, Layout, PanelBar},
};
use crossterm::{cursor, terminal, QueueableCommand};
use panelmon_core::Snapshot;
use std::io::{self, Write};

/// Main drawing coordinator
pub struct Drawer {
    layout: Layout,
    colors: ColorScheme,
    view: IndicatorView,
}

impl Drawer {
    pub fn new(layout: Layout, colors: ColorScheme, view: IndicatorView) -> Self {
        Self {
            layout,
            colors,
            view,
        }
    }

    /// Draw the complete UI
    pub fn draw<W: Write>(
        &mut self,
        writer: &mut W,
        snapshot: Option<&Snapshot>,
        state: &DrawState,
    ) -> io::Result<()> {
        writer.queue(terminal::Clear(terminal::ClearType::All))?;
        writer.queue(cursor::MoveTo(0, 0))?;

        let lines = snapshot.map(|s| self.view.menu_lines(s)).unwrap_or_default();
        let main_layout = self.layout.main_layout(Dropdown::rows(&lines));

        let label = match snapshot {
            Some(snapshot) => self.view.panel_label(snapshot),
            None => "Initializing...".to_string(),
        };
        PanelBar.render(writer, main_layout.panel, &label, state.menu_open, &self.colors)?;

        if state.menu_open {
            Dropdown.render(
                writer,
                main_layout.dropdown,
                &lines,
                state.interval_secs,
                &self.colors,
            )?;
        }

        Footer.render(writer, main_layout.footer, &state.status, &self.colors)?;

        if state.show_help {
            HelpOverlay.render(writer, self.layout.terminal_rect(), &self.colors)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn view(&self) -> &IndicatorView {
        &self.view
    }

    /// Update layout for terminal size changes
    pub fn update_layout(&mut self) -> anyhow::Result<()> {
        self.layout.update_terminal_size()
    }
}

/// State needed for drawing
#[derive(Debug, Clone)]
pub struct DrawState {
    pub menu_open: bool,
    pub show_help: bool,
    pub interval_secs: u32,
    /// Short message shown in the footer
    pub status: String,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            menu_open: false,
            show_help: false,
            interval_secs: 2,
            status: String::new(),
        }
    }
}
