//! Core parser infrastructure: the terminal command model, the emission
//! traits and the ANSI/VT escape sequence parser.

mod ansi;
pub use ansi::AnsiParser;

pub mod control_codes;

/// Erase in Display mode for the ED command (`ESC[{n}J`)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseInDisplayMode {
    /// Clear from cursor to end of display
    CursorToEnd = 0,
    /// Clear from start of display to cursor
    StartToCursor = 1,
    /// Clear entire display
    All = 2,
    /// Clear entire display and scrollback buffer
    AllAndScrollback = 3,
}

impl EraseInDisplayMode {
    fn from_u16(n: u16) -> Option<Self> {
        match n {
            0 => Some(Self::CursorToEnd),
            1 => Some(Self::StartToCursor),
            2 => Some(Self::All),
            3 => Some(Self::AllAndScrollback),
            _ => None,
        }
    }
}

/// Erase in Line mode for the EL command (`ESC[{n}K`)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseInLineMode {
    /// Clear from cursor to end of line
    CursorToEnd = 0,
    /// Clear from start of line to cursor
    StartToCursor = 1,
    /// Clear entire line
    All = 2,
}

impl EraseInLineMode {
    fn from_u16(n: u16) -> Option<Self> {
        match n {
            0 => Some(Self::CursorToEnd),
            1 => Some(Self::StartToCursor),
            2 => Some(Self::All),
            _ => None,
        }
    }
}

/// Device Status Report type for the DSR command (`ESC[{n}n`)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatusReport {
    /// Report operating status (reply: `ESC[0n` = OK)
    OperatingStatus = 5,
    /// Report cursor position (reply: `ESC[{row};{col}R`)
    CursorPosition = 6,
}

impl DeviceStatusReport {
    fn from_u16(n: u16) -> Option<Self> {
        match n {
            5 => Some(Self::OperatingStatus),
            6 => Some(Self::CursorPosition),
            _ => None,
        }
    }
}

/// Charset slot selected by `ESC (` (G0) or `ESC )` (G1).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetSlot {
    G0,
    G1,
}

/// The eight base colors of the `TERM=linux` palette, by their
/// traditional console names.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Brown,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl NamedColor {
    /// SGR color offset (0-7) to console color name.
    pub fn from_offset(n: u16) -> Option<Self> {
        match n {
            0 => Some(Self::Black),
            1 => Some(Self::Red),
            2 => Some(Self::Green),
            3 => Some(Self::Brown),
            4 => Some(Self::Blue),
            5 => Some(Self::Magenta),
            6 => Some(Self::Cyan),
            7 => Some(Self::White),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::Red => "red",
            Self::Green => "green",
            Self::Brown => "brown",
            Self::Blue => "blue",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::White => "white",
        }
    }
}

/// Color operand of an SGR foreground/background attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiColor {
    /// Base palette color (30-37 / 40-47)
    Named(NamedColor),
    /// Extended 256-color palette lookup (`38;5;n` / `48;5;n`)
    Extended(u8),
    /// 24-bit RGB (`38;2;r;g;b` / `48;2;r;g;b`)
    Rgb(u8, u8, u8),
    /// Default/terminal color (39 / 49)
    Default,
}

/// SGR (Select Graphic Rendition) attributes for `ESC[...m` sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgrAttribute {
    /// Reset all attributes to default
    Reset,
    Bold(bool),
    Italics(bool),
    Underscore(bool),
    Strikethrough(bool),
    Reverse(bool),
    Foreground(AnsiColor),
    Background(AnsiColor),
}

/// Parser error types. All of these are recoverable; the screen treats
/// reported errors as noops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Escape sequence with an unrecognized final character
    UnknownSequence { description: &'static str, final_char: char },
    /// Invalid parameter value for a recognized command
    InvalidParameter { command: &'static str, value: u16 },
}

#[derive(Debug, PartialEq)]
pub enum TerminalCommand<'a> {
    /// A contiguous run of printable characters.
    Draw(&'a str),

    // Basic control characters (C0 controls)
    Bell,
    Backspace,
    Tab,
    LineFeed,
    CarriageReturn,
    /// SO - select the G1 charset
    ShiftOut,
    /// SI - select the G0 charset
    ShiftIn,

    // ANSI ESC sequences (non-CSI)
    /// RIS - Reset to Initial State: ESC c
    EscReset,
    /// IND - Index: ESC D (move cursor down, scroll at bottom margin)
    EscIndex,
    /// NEL - Next Line: ESC E (linefeed)
    EscNextLine,
    /// RI - Reverse Index: ESC M (move cursor up, scroll at top margin)
    EscReverseIndex,
    /// HTS - Horizontal Tab Set: ESC H
    EscSetTabStop,
    /// DECSC - Save Cursor: ESC 7
    EscSaveCursor,
    /// DECRC - Restore Cursor: ESC 8
    EscRestoreCursor,
    /// DECALN - Screen Alignment Pattern: ESC # 8
    EscAlignmentDisplay,
    /// Linux charset selection ESC % G / ESC % 8 (UTF-8)
    EscCharsetUtf8,
    /// Linux charset selection ESC % @ (default)
    EscCharsetDefault,
    /// Define the G0/G1 charset: ESC ( {code} / ESC ) {code}
    EscDefineCharset(CharsetSlot, char),

    // ANSI CSI (Control Sequence Introducer) sequences
    /// ICH - Insert Character: ESC[{n}@
    CsiInsertCharacters(u16),
    /// CUU - Cursor Up: ESC[{n}A
    CsiCursorUp(u16),
    /// CUD - Cursor Down: ESC[{n}B (also VPR: ESC[{n}e)
    CsiCursorDown(u16),
    /// CUF - Cursor Forward: ESC[{n}C (also HPR: ESC[{n}a)
    CsiCursorForward(u16),
    /// CUB - Cursor Back: ESC[{n}D
    CsiCursorBack(u16),
    /// CNL - Cursor Next Line: ESC[{n}E
    CsiCursorDown1(u16),
    /// CPL - Cursor Previous Line: ESC[{n}F
    CsiCursorUp1(u16),
    /// CHA - Cursor Horizontal Absolute: ESC[{n}G (also HPA: ESC[{n}`)
    CsiCursorToColumn(u16),
    /// CUP - Cursor Position: ESC[{row};{col}H or ESC[{row};{col}f
    CsiCursorPosition(u16, u16),
    /// ED - Erase in Display: ESC[{n}J
    CsiEraseInDisplay(EraseInDisplayMode),
    /// EL - Erase in Line: ESC[{n}K
    CsiEraseInLine(EraseInLineMode),
    /// IL - Insert Line: ESC[{n}L
    CsiInsertLines(u16),
    /// DL - Delete Line: ESC[{n}M
    CsiDeleteLines(u16),
    /// DCH - Delete Character: ESC[{n}P
    CsiDeleteCharacters(u16),
    /// ECH - Erase Character: ESC[{n}X
    CsiEraseCharacters(u16),
    /// DA - Device Attributes: ESC[{n}c
    CsiDeviceAttributes(u16),
    /// VPA - Vertical Position Absolute: ESC[{n}d
    CsiCursorToLine(u16),
    /// TBC - Tab Clear: ESC[{n}g
    CsiClearTabStop(u16),
    /// SM - Set Mode: ESC[{..}h / DECSET: ESC[?{..}h
    CsiSetMode { params: &'a [u16], private: bool },
    /// RM - Reset Mode: ESC[{..}l / DECRST: ESC[?{..}l
    CsiResetMode { params: &'a [u16], private: bool },
    /// SGR - Select Graphic Rendition: ESC[{..}m.
    /// Emitted once per attribute in a sequence.
    CsiSelectGraphicRendition(SgrAttribute),
    /// DSR - Device Status Report: ESC[{n}n
    CsiDeviceStatusReport(DeviceStatusReport),
    /// DECSTBM - Set Scrolling Region: ESC[{top};{bottom}r
    CsiSetMargins(u16, u16),
}

pub trait CommandSink {
    fn emit(&mut self, cmd: TerminalCommand<'_>);

    /// Report a parsing error. Default implementation does nothing.
    fn report_error(&mut self, _error: ParseError) {}
}

pub trait CommandParser {
    fn parse(&mut self, input: &str, sink: &mut dyn CommandSink);
}
