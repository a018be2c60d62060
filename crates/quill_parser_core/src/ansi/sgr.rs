//! SGR (Select Graphic Rendition) handling
//!
//! Translates the parameter list of a `CSI ... m` sequence into typed
//! attribute commands. An empty list or a lone `0` resets everything;
//! a `0` inside a longer list has no effect. Unrecognized codes are
//! dropped without an error.

use crate::{AnsiColor, CommandSink, NamedColor, SgrAttribute, TerminalCommand};

fn emit(sink: &mut dyn CommandSink, attr: SgrAttribute) {
    sink.emit(TerminalCommand::CsiSelectGraphicRendition(attr));
}

/// Parse SGR parameters and emit one command per attribute.
///
/// Handles:
/// - the reset fast path (`ESC[m`, `ESC[0m`)
/// - bold / italics / underscore / strikethrough / reverse set+clear pairs
/// - the 16-color palette (30-37, 40-47) and defaults (39, 49)
/// - 256-color mode (`38;5;n`, `48;5;n`) and RGB (`38;2;r;g;b`, `48;2;r;g;b`)
/// - AIXTERM bright colors (90-97, 100-107), which imply bold
pub(crate) fn parse_sgr(params: &[u16], sink: &mut dyn CommandSink) {
    if params.is_empty() || matches!(params, [0]) {
        emit(sink, SgrAttribute::Reset);
        return;
    }

    let mut i = 0;
    while i < params.len() {
        let code = params[i];
        match code {
            1 => emit(sink, SgrAttribute::Bold(true)),
            3 => emit(sink, SgrAttribute::Italics(true)),
            4 => emit(sink, SgrAttribute::Underscore(true)),
            7 => emit(sink, SgrAttribute::Reverse(true)),
            9 => emit(sink, SgrAttribute::Strikethrough(true)),
            22 => emit(sink, SgrAttribute::Bold(false)),
            23 => emit(sink, SgrAttribute::Italics(false)),
            24 => emit(sink, SgrAttribute::Underscore(false)),
            27 => emit(sink, SgrAttribute::Reverse(false)),
            29 => emit(sink, SgrAttribute::Strikethrough(false)),
            30..=37 => {
                if let Some(color) = NamedColor::from_offset(code - 30) {
                    emit(sink, SgrAttribute::Foreground(AnsiColor::Named(color)));
                }
            }
            39 => emit(sink, SgrAttribute::Foreground(AnsiColor::Default)),
            40..=47 => {
                if let Some(color) = NamedColor::from_offset(code - 40) {
                    emit(sink, SgrAttribute::Background(AnsiColor::Named(color)));
                }
            }
            49 => emit(sink, SgrAttribute::Background(AnsiColor::Default)),
            38 | 48 => {
                i = parse_extended_color(params, i, code == 38, sink);
                continue;
            }
            90..=97 => {
                if let Some(color) = NamedColor::from_offset(code - 90) {
                    emit(sink, SgrAttribute::Foreground(AnsiColor::Named(color)));
                    emit(sink, SgrAttribute::Bold(true));
                }
            }
            100..=107 => {
                if let Some(color) = NamedColor::from_offset(code - 100) {
                    emit(sink, SgrAttribute::Background(AnsiColor::Named(color)));
                    emit(sink, SgrAttribute::Bold(true));
                }
            }
            // Unknown attributes (including 0 inside a longer list) are
            // ignored.
            _ => {}
        }
        i += 1;
    }
}

/// Extended color: `38;5;n` / `48;5;n` (256-color palette) or
/// `38;2;r;g;b` / `48;2;r;g;b` (24-bit RGB). Returns the index of the
/// next unconsumed parameter. A truncated sequence consumes what it
/// attempted to read and applies nothing.
fn parse_extended_color(params: &[u16], i: usize, foreground: bool, sink: &mut dyn CommandSink) -> usize {
    let wrap = |color| {
        if foreground {
            SgrAttribute::Foreground(color)
        } else {
            SgrAttribute::Background(color)
        }
    };

    match params.get(i + 1) {
        Some(5) => {
            if let Some(&n) = params.get(i + 2) {
                emit(sink, wrap(AnsiColor::Extended(n as u8)));
                i + 3
            } else {
                params.len()
            }
        }
        Some(2) => {
            if i + 4 < params.len() {
                let r = params[i + 2] as u8;
                let g = params[i + 3] as u8;
                let b = params[i + 4] as u8;
                emit(sink, wrap(AnsiColor::Rgb(r, g, b)));
                i + 5
            } else {
                params.len()
            }
        }
        // Unknown sub-selector: skip it together with the introducer.
        Some(_) => i + 2,
        None => i + 1,
    }
}
