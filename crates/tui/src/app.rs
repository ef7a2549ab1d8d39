use crate::{
    draw::{DrawState, Drawer},
    indicator::IndicatorView,
    input::{InputEvent, InputHandler},
    ui::{ColorScheme, Layout},
};
use panelmon_core::{ChannelAdapter, Config, Sampler, Sensor, Snapshot};
use std::{
    sync::{
        mpsc::{Receiver, TryRecvError},
        Arc,
    },
    time::Duration,
};
use tracing::{info, warn};

/// Snapshots the UI may fall behind by before the sampler starts dropping
const SNAPSHOT_QUEUE: usize = 4;

/// How long to wait for a key before checking for new snapshots
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Terminal indicator: panel label, dropdown summary and interval preference
pub struct App {
    config: Config,
    sampler: Sampler,
    snapshots: Receiver<Arc<Snapshot>>,
    input_handler: InputHandler,
    drawer: Drawer,
    state: DrawState,
    current_snapshot: Option<Arc<Snapshot>>,
    quit_requested: bool,
    update_count: u64,
}

impl App {
    /// `ascii` swaps emoji symbols for text tags
    pub fn new(config: Config, sensors: Vec<Box<dyn Sensor>>, ascii: bool) -> anyhow::Result<Self> {
        Ok(Self::with_layout(config, sensors, ascii, Layout::new()?))
    }

    pub fn with_layout(
        config: Config,
        sensors: Vec<Box<dyn Sensor>>,
        ascii: bool,
        layout: Layout,
    ) -> Self {
        let (adapter, snapshots) = ChannelAdapter::new(SNAPSHOT_QUEUE);
        let sampler = Sampler::new(sensors, Box::new(adapter));

        let colors = ColorScheme::new(&config.theme, config.no_color);
        let drawer = Drawer::new(layout, colors, IndicatorView::new(ascii));
        let state = DrawState {
            interval_secs: config.interval_secs,
            ..DrawState::default()
        };

        Self {
            config,
            sampler,
            snapshots,
            input_handler: InputHandler::new(),
            drawer,
            state,
            current_snapshot: None,
            quit_requested: false,
            update_count: 0,
        }
    }

    /// Main application loop
    pub fn run<W: std::io::Write>(&mut self, writer: &mut W) -> anyhow::Result<()> {
        // before raw mode, so an elevation prompt can still use the terminal
        self.sampler.start(self.config.clone())?;

        self.setup_terminal()?;
        let _terminal_guard = TerminalGuard;

        self.render(writer)?;

        while !self.quit_requested {
            let event = self.input_handler.poll_event(INPUT_POLL)?;
            let mut needs_redraw = self.handle_event(event);

            if self.drain_snapshots() {
                needs_redraw = true;
            }

            if needs_redraw && !self.quit_requested {
                self.render(writer)?;
            }
        }

        self.sampler.stop();
        info!(updates = self.update_count, "indicator closed");
        Ok(())
    }

    /// Keep only the newest queued snapshot; true if there was one
    fn drain_snapshots(&mut self) -> bool {
        let mut updated = false;
        loop {
            match self.snapshots.try_recv() {
                Ok(snapshot) => {
                    self.current_snapshot = Some(snapshot);
                    self.update_count += 1;
                    updated = true;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("sampler went away");
                    self.quit_requested = true;
                    break;
                }
            }
        }
        updated
    }

    /// Handle input events; true if the screen changed
    fn handle_event(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::Quit => {
                self.quit_requested = true;
                false
            }
            InputEvent::ShowHelp => {
                self.state.show_help = !self.state.show_help;
                true
            }
            InputEvent::ToggleMenu => {
                self.state.menu_open = !self.state.menu_open;
                true
            }
            InputEvent::SetInterval(secs) => {
                self.set_interval(secs);
                true
            }
            InputEvent::Resize => {
                if let Err(e) = self.drawer.update_layout() {
                    warn!(error = %e, "could not read terminal size");
                }
                true
            }
            InputEvent::Tick | InputEvent::Unknown => false,
        }
    }

    fn set_interval(&mut self, secs: u32) {
        if secs == self.config.interval_secs {
            return;
        }

        let config = self.config.with_interval(secs);
        match self.sampler.reconfigure(config.clone()) {
            Ok(()) => {
                self.config = config;
                self.state.interval_secs = secs;
                self.state.status = format!("updating every {}s", secs);
            }
            Err(e) => self.state.status = e.to_string(),
        }
    }

    fn render<W: std::io::Write>(&mut self, writer: &mut W) -> anyhow::Result<()> {
        self.drawer
            .draw(writer, self.current_snapshot.as_deref(), &self.state)?;
        Ok(())
    }

    fn setup_terminal(&self) -> anyhow::Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide
        )?;
        Ok(())
    }
}

/// RAII guard to restore terminal state on drop
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::cursor::Show,
            crossterm::terminal::LeaveAlternateScreen
        );
        let _ = crossterm::terminal::disable_raw_mode();
    }
}
