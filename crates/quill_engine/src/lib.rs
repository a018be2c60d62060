//! Terminal engine: styled cell grid, cursor, scrollback history and the
//! emulator facade that feeds decoded PTY output through the parser into
//! the screen.

mod caret;
mod cell;
mod charsets;
mod color;
mod decoder;
mod emulator;
mod history;
mod line;
mod parser_sink;
mod position;
mod screen;

pub mod modes;

pub use caret::{Caret, Savepoint};
pub use cell::{Cell, CellFlags};
pub use charsets::Charset;
pub use color::{TermColor, XTERM_256_PALETTE};
pub use decoder::{ByteDecoder, Encoding, ErrorPolicy};
pub use emulator::{ColorRun, TerminalEmulator};
pub use history::{History, HistoryScreen};
pub use line::Line;
pub use parser_sink::ScreenSink;
pub use position::{Margins, Position};
pub use screen::Screen;
