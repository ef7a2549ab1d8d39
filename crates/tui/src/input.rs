use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Input events that the indicator can handle
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Switch to an update interval in seconds
    SetInterval(u32),
    ToggleMenu,
    ShowHelp,
    Quit,

    Resize,
    Tick,

    Unknown,
}

/// Input handler that converts crossterm events to application events
#[derive(Debug, Default)]
pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    /// Poll for input events with a timeout
    pub fn poll_event(&mut self, timeout: Duration) -> anyhow::Result<InputEvent> {
        if !event::poll(timeout)? {
            return Ok(InputEvent::Tick);
        }
        match event::read()? {
            Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
                Ok(self.handle_key_event(key_event))
            }
            Event::Resize(_, _) => Ok(InputEvent::Resize),
            _ => Ok(InputEvent::Unknown),
        }
    }

    /// Handle keyboard input
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> InputEvent {
        if key_event.modifiers.contains(KeyModifiers::CONTROL)
            && key_event.code == KeyCode::Char('c')
        {
            return InputEvent::Quit;
        }

        match key_event.code {
            KeyCode::Char('1') => InputEvent::SetInterval(1),
            KeyCode::Char('2') => InputEvent::SetInterval(2),
            KeyCode::Char('5') => InputEvent::SetInterval(5),

            KeyCode::Char('m') | KeyCode::Enter => InputEvent::ToggleMenu,
            KeyCode::Char('?') => InputEvent::ShowHelp,
            KeyCode::Char('q') | KeyCode::Esc => InputEvent::Quit,

            _ => InputEvent::Unknown,
        }
    }
}
