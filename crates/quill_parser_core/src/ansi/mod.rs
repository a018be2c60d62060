//! ANSI escape sequence parser
//!
//! Parses the `TERM=linux` / VT102 / VT220 subset of console codes into
//! structured commands. Supports C0 controls, simple ESC sequences and CSI
//! (Control Sequence Introducer) sequences; anything else is reported
//! through [`CommandSink::report_error`] and otherwise ignored.

mod sgr;

use crate::control_codes::{BEL, BS, CAN, CR, CSI, DEL, ESC, FF, HT, LF, NUL, SI, SO, SUB, VT};
use crate::{
    CharsetSlot, CommandParser, CommandSink, DeviceStatusReport, EraseInDisplayMode, EraseInLineMode, ParseError,
    TerminalCommand,
};

/// Parameters are unsigned decimal integers; anything greater than 9999 is
/// clamped, and a missing value is 0.
const MAX_PARAM: u32 = 9999;

#[derive(Default)]
pub struct AnsiParser {
    state: ParserState,
    params: Vec<u16>,
    current: u32,
    private: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ParserState {
    #[default]
    Ground,
    Escape,
    // ESC # <c>
    EscapeSharp,
    // ESC % <c>
    EscapePercent,
    // ESC ( <c> / ESC ) <c>
    CharsetG0,
    CharsetG1,
    // ESC [ ...
    CsiEntry,
}

impl AnsiParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.state = ParserState::Ground;
        self.params.clear();
        self.current = 0;
        self.private = false;
    }

    fn enter_csi(&mut self) {
        self.state = ParserState::CsiEntry;
        self.params.clear();
        self.current = 0;
        self.private = false;
    }

    fn push_param(&mut self) {
        self.params.push(self.current.min(MAX_PARAM) as u16);
        self.current = 0;
    }

    /// Dispatch a basic C0 control. Also used for controls embedded inside
    /// a CSI parameter stream.
    fn dispatch_control(ch: char, sink: &mut dyn CommandSink) {
        match ch {
            BEL => sink.emit(TerminalCommand::Bell),
            BS => sink.emit(TerminalCommand::Backspace),
            HT => sink.emit(TerminalCommand::Tab),
            LF | VT | FF => sink.emit(TerminalCommand::LineFeed),
            CR => sink.emit(TerminalCommand::CarriageReturn),
            SO => sink.emit(TerminalCommand::ShiftOut),
            SI => sink.emit(TerminalCommand::ShiftIn),
            _ => {}
        }
    }

    fn handle_escape(&mut self, ch: char, sink: &mut dyn CommandSink) {
        match ch {
            '[' => {
                self.enter_csi();
                return;
            }
            '#' => {
                self.state = ParserState::EscapeSharp;
                return;
            }
            '%' => {
                self.state = ParserState::EscapePercent;
                return;
            }
            '(' => {
                self.state = ParserState::CharsetG0;
                return;
            }
            ')' => {
                self.state = ParserState::CharsetG1;
                return;
            }
            'c' => sink.emit(TerminalCommand::EscReset),
            'D' => sink.emit(TerminalCommand::EscIndex),
            'E' => sink.emit(TerminalCommand::EscNextLine),
            'H' => sink.emit(TerminalCommand::EscSetTabStop),
            'M' => sink.emit(TerminalCommand::EscReverseIndex),
            '7' => sink.emit(TerminalCommand::EscSaveCursor),
            '8' => sink.emit(TerminalCommand::EscRestoreCursor),
            _ => {
                sink.report_error(ParseError::UnknownSequence {
                    description: "unrecognized escape sequence",
                    final_char: ch,
                });
            }
        }
        self.reset();
    }

    fn handle_csi_final(&self, final_char: char, sink: &mut dyn CommandSink) {
        let p0 = self.params.first().copied().unwrap_or(0);
        let p1 = self.params.get(1).copied().unwrap_or(0);

        match final_char {
            '@' => sink.emit(TerminalCommand::CsiInsertCharacters(p0)),
            'A' => sink.emit(TerminalCommand::CsiCursorUp(p0)),
            // VPR is an alias for cursor down, HPR for cursor forward.
            'B' | 'e' => sink.emit(TerminalCommand::CsiCursorDown(p0)),
            'C' | 'a' => sink.emit(TerminalCommand::CsiCursorForward(p0)),
            'D' => sink.emit(TerminalCommand::CsiCursorBack(p0)),
            'E' => sink.emit(TerminalCommand::CsiCursorDown1(p0)),
            'F' => sink.emit(TerminalCommand::CsiCursorUp1(p0)),
            'G' | '`' => sink.emit(TerminalCommand::CsiCursorToColumn(p0)),
            'H' | 'f' => sink.emit(TerminalCommand::CsiCursorPosition(p0, p1)),
            'J' => match EraseInDisplayMode::from_u16(p0) {
                Some(mode) => sink.emit(TerminalCommand::CsiEraseInDisplay(mode)),
                None => sink.report_error(ParseError::InvalidParameter {
                    command: "CsiEraseInDisplay",
                    value: p0,
                }),
            },
            'K' => match EraseInLineMode::from_u16(p0) {
                Some(mode) => sink.emit(TerminalCommand::CsiEraseInLine(mode)),
                None => sink.report_error(ParseError::InvalidParameter {
                    command: "CsiEraseInLine",
                    value: p0,
                }),
            },
            'L' => sink.emit(TerminalCommand::CsiInsertLines(p0)),
            'M' => sink.emit(TerminalCommand::CsiDeleteLines(p0)),
            'P' => sink.emit(TerminalCommand::CsiDeleteCharacters(p0)),
            'X' => sink.emit(TerminalCommand::CsiEraseCharacters(p0)),
            'c' => sink.emit(TerminalCommand::CsiDeviceAttributes(p0)),
            'd' => sink.emit(TerminalCommand::CsiCursorToLine(p0)),
            'g' => sink.emit(TerminalCommand::CsiClearTabStop(p0)),
            'h' => sink.emit(TerminalCommand::CsiSetMode {
                params: &self.params,
                private: self.private,
            }),
            'l' => sink.emit(TerminalCommand::CsiResetMode {
                params: &self.params,
                private: self.private,
            }),
            'm' => sgr::parse_sgr(&self.params, sink),
            'n' => {
                // Only operating status (5) and cursor position (6) are
                // answered; other report requests are silently dropped.
                if let Some(report) = DeviceStatusReport::from_u16(p0) {
                    sink.emit(TerminalCommand::CsiDeviceStatusReport(report));
                }
            }
            'r' => sink.emit(TerminalCommand::CsiSetMargins(p0, p1)),
            _ => {
                sink.report_error(ParseError::UnknownSequence {
                    description: "unrecognized CSI sequence",
                    final_char,
                });
            }
        }
    }
}

impl CommandParser for AnsiParser {
    fn parse(&mut self, input: &str, sink: &mut dyn CommandSink) {
        let mut printable_start = 0;

        for (i, ch) in input.char_indices() {
            match self.state {
                ParserState::Ground => match ch {
                    ESC => {
                        if i > printable_start {
                            sink.emit(TerminalCommand::Draw(&input[printable_start..i]));
                        }
                        self.state = ParserState::Escape;
                        printable_start = i + ch.len_utf8();
                    }
                    CSI => {
                        if i > printable_start {
                            sink.emit(TerminalCommand::Draw(&input[printable_start..i]));
                        }
                        self.enter_csi();
                        printable_start = i + ch.len_utf8();
                    }
                    BEL | BS | HT | LF | VT | FF | CR | SO | SI => {
                        if i > printable_start {
                            sink.emit(TerminalCommand::Draw(&input[printable_start..i]));
                        }
                        Self::dispatch_control(ch, sink);
                        printable_start = i + ch.len_utf8();
                    }
                    NUL | DEL => {
                        // Dropped without any effect on the screen.
                        if i > printable_start {
                            sink.emit(TerminalCommand::Draw(&input[printable_start..i]));
                        }
                        printable_start = i + ch.len_utf8();
                    }
                    _ => {}
                },

                ParserState::Escape => {
                    self.handle_escape(ch, sink);
                    printable_start = i + ch.len_utf8();
                }

                ParserState::EscapeSharp => {
                    if ch == '8' {
                        sink.emit(TerminalCommand::EscAlignmentDisplay);
                    } else {
                        sink.report_error(ParseError::UnknownSequence {
                            description: "unrecognized ESC # sequence",
                            final_char: ch,
                        });
                    }
                    self.reset();
                    printable_start = i + ch.len_utf8();
                }

                ParserState::EscapePercent => {
                    match ch {
                        '@' => sink.emit(TerminalCommand::EscCharsetDefault),
                        'G' | '8' => sink.emit(TerminalCommand::EscCharsetUtf8),
                        _ => {
                            sink.report_error(ParseError::UnknownSequence {
                                description: "unrecognized ESC % sequence",
                                final_char: ch,
                            });
                        }
                    }
                    self.reset();
                    printable_start = i + ch.len_utf8();
                }

                ParserState::CharsetG0 => {
                    sink.emit(TerminalCommand::EscDefineCharset(CharsetSlot::G0, ch));
                    self.reset();
                    printable_start = i + ch.len_utf8();
                }

                ParserState::CharsetG1 => {
                    sink.emit(TerminalCommand::EscDefineCharset(CharsetSlot::G1, ch));
                    self.reset();
                    printable_start = i + ch.len_utf8();
                }

                ParserState::CsiEntry => {
                    match ch {
                        '0'..='9' => {
                            let digit = ch as u32 - '0' as u32;
                            self.current = (self.current.saturating_mul(10)).saturating_add(digit);
                        }
                        ';' => self.push_param(),
                        '?' => self.private = true,
                        // Secondary DA markers and intermediates are not
                        // handled; the parameter stream continues.
                        ' ' | '>' => {}
                        BEL | BS | HT | LF | VT | FF | CR => {
                            Self::dispatch_control(ch, sink);
                        }
                        CAN | SUB => {
                            // The sequence is aborted and the terminal
                            // displays the substitute character.
                            sink.emit(TerminalCommand::Draw(&input[i..i + ch.len_utf8()]));
                            self.reset();
                        }
                        '@'..='~' => {
                            self.push_param();
                            self.handle_csi_final(ch, sink);
                            self.reset();
                        }
                        _ => {
                            sink.report_error(ParseError::UnknownSequence {
                                description: "invalid character in CSI parameters",
                                final_char: ch,
                            });
                            self.reset();
                        }
                    }
                    printable_start = i + ch.len_utf8();
                }
            }
        }

        if self.state == ParserState::Ground && input.len() > printable_start {
            sink.emit(TerminalCommand::Draw(&input[printable_start..]));
        }
    }
}
