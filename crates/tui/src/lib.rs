pub mod app;
pub mod draw;
pub mod format;
pub mod indicator;
pub mod input;
pub mod line;
pub mod ui;

pub use app::App;
pub use draw::{DrawState, Drawer};
pub use indicator::{IndicatorView, MenuLine};
pub use input::{InputEvent, InputHandler};
pub use line::{LineFormat, LinePrinter};
pub use ui::*;
