//! CommandSink implementation for [`HistoryScreen`]
//!
//! `ScreenSink` adapts the `quill_parser_core` command stream onto the
//! screen's operations, so a parser can drive the emulation directly:
//!
//! ```no_run
//! use quill_engine::{HistoryScreen, ScreenSink};
//! use quill_parser_core::{AnsiParser, CommandParser};
//!
//! let mut screen = HistoryScreen::new(80, 24, 100, 0.5);
//! let mut sink = ScreenSink::new(&mut screen);
//! let mut parser = AnsiParser::new();
//!
//! parser.parse("\x1b[1;32mHello, World!\x1b[0m", &mut sink);
//! ```

use quill_parser_core::{CommandSink, ParseError, TerminalCommand};

use crate::HistoryScreen;

pub struct ScreenSink<'a> {
    screen: &'a mut HistoryScreen,
}

impl<'a> ScreenSink<'a> {
    pub fn new(screen: &'a mut HistoryScreen) -> Self {
        Self { screen }
    }
}

impl CommandSink for ScreenSink<'_> {
    fn emit(&mut self, cmd: TerminalCommand<'_>) {
        match cmd {
            TerminalCommand::Draw(text) => self.screen.draw(text),

            TerminalCommand::Bell => self.screen.bell(),
            TerminalCommand::Backspace => self.screen.backspace(),
            TerminalCommand::Tab => self.screen.tab(),
            TerminalCommand::LineFeed => self.screen.linefeed(),
            TerminalCommand::CarriageReturn => self.screen.carriage_return(),
            TerminalCommand::ShiftOut => self.screen.shift_out(),
            TerminalCommand::ShiftIn => self.screen.shift_in(),

            TerminalCommand::EscReset => self.screen.reset(),
            TerminalCommand::EscIndex => self.screen.index(),
            TerminalCommand::EscNextLine => self.screen.linefeed(),
            TerminalCommand::EscReverseIndex => self.screen.reverse_index(),
            TerminalCommand::EscSetTabStop => self.screen.set_tab_stop(),
            TerminalCommand::EscSaveCursor => self.screen.save_cursor(),
            TerminalCommand::EscRestoreCursor => self.screen.restore_cursor(),
            TerminalCommand::EscAlignmentDisplay => self.screen.alignment_display(),
            // Decoder-mode selection; the byte decoder chain already
            // handles UTF-8, so these are accepted without effect.
            TerminalCommand::EscCharsetUtf8 | TerminalCommand::EscCharsetDefault => {}
            TerminalCommand::EscDefineCharset(slot, code) => self.screen.define_charset(slot, code),

            TerminalCommand::CsiInsertCharacters(n) => self.screen.insert_characters(n as usize),
            TerminalCommand::CsiCursorUp(n) => self.screen.cursor_up(n as usize),
            TerminalCommand::CsiCursorDown(n) => self.screen.cursor_down(n as usize),
            TerminalCommand::CsiCursorForward(n) => self.screen.cursor_forward(n as usize),
            TerminalCommand::CsiCursorBack(n) => self.screen.cursor_back(n as usize),
            TerminalCommand::CsiCursorDown1(n) => self.screen.cursor_down1(n as usize),
            TerminalCommand::CsiCursorUp1(n) => self.screen.cursor_up1(n as usize),
            TerminalCommand::CsiCursorToColumn(n) => self.screen.cursor_to_column(n),
            TerminalCommand::CsiCursorPosition(line, column) => self.screen.cursor_position(line, column),
            TerminalCommand::CsiEraseInDisplay(how) => self.screen.erase_in_display(how),
            TerminalCommand::CsiEraseInLine(how) => self.screen.erase_in_line(how),
            TerminalCommand::CsiInsertLines(n) => self.screen.insert_lines(n as usize),
            TerminalCommand::CsiDeleteLines(n) => self.screen.delete_lines(n as usize),
            TerminalCommand::CsiDeleteCharacters(n) => self.screen.delete_characters(n as usize),
            TerminalCommand::CsiEraseCharacters(n) => self.screen.erase_characters(n as usize),
            TerminalCommand::CsiDeviceAttributes(mode) => self.screen.report_device_attributes(mode),
            TerminalCommand::CsiCursorToLine(n) => self.screen.cursor_to_line(n),
            TerminalCommand::CsiClearTabStop(how) => self.screen.clear_tab_stop(how),
            TerminalCommand::CsiSetMode { params, private } => {
                let params: Vec<u32> = params.iter().map(|&p| p as u32).collect();
                self.screen.set_mode(&params, private);
            }
            TerminalCommand::CsiResetMode { params, private } => {
                let params: Vec<u32> = params.iter().map(|&p| p as u32).collect();
                self.screen.reset_mode(&params, private);
            }
            TerminalCommand::CsiSelectGraphicRendition(attr) => self.screen.select_graphic_rendition(attr),
            TerminalCommand::CsiDeviceStatusReport(report) => self.screen.report_device_status(report),
            TerminalCommand::CsiSetMargins(top, bottom) => self.screen.set_margins(top, bottom),
        }
    }

    fn report_error(&mut self, error: ParseError) {
        // Unrecognized escapes never raise; the stream continues.
        log::debug!("ignoring parse anomaly: {error:?}");
    }
}
