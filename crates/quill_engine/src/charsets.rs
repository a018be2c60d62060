//! Character set translation tables shared read-only across screens.
//!
//! Two slots (`G0`, `G1`) each hold one of these tables; SI/SO select the
//! active slot and `ESC (` / `ESC )` redefine a slot by code.

/// A named translation map selectable via `ESC ( {code}` / `ESC ) {code}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// Latin-1 passthrough (`B`), the G0 default.
    Lat1,
    /// DEC special graphics / line drawing (`0`), the G1 default.
    Vt100,
    /// United Kingdom: like Latin-1 with a pound sign at `#` (`A`).
    Uk,
    /// IBM PC passthrough (`U`).
    Ibmpc,
}

impl Charset {
    pub fn from_code(code: char) -> Option<Charset> {
        match code {
            'B' => Some(Charset::Lat1),
            '0' => Some(Charset::Vt100),
            'A' => Some(Charset::Uk),
            'U' => Some(Charset::Ibmpc),
            _ => None,
        }
    }

    pub fn translate(self, ch: char) -> char {
        match self {
            Charset::Lat1 | Charset::Ibmpc => ch,
            Charset::Uk => {
                if ch == '#' {
                    '£'
                } else {
                    ch
                }
            }
            Charset::Vt100 => vt100_graphics(ch),
        }
    }
}

/// DEC special graphics: the printable range 0x60..=0x7e maps onto
/// line-drawing and control-picture glyphs; everything else passes
/// through.
fn vt100_graphics(ch: char) -> char {
    match ch {
        '`' => '\u{25c6}', // ◆
        'a' => '\u{2592}', // ▒
        'b' => '\u{2409}', // ␉
        'c' => '\u{240c}', // ␌
        'd' => '\u{240d}', // ␍
        'e' => '\u{240a}', // ␊
        'f' => '\u{00b0}', // °
        'g' => '\u{00b1}', // ±
        'h' => '\u{2424}', // ␤
        'i' => '\u{240b}', // ␋
        'j' => '\u{2518}', // ┘
        'k' => '\u{2510}', // ┐
        'l' => '\u{250c}', // ┌
        'm' => '\u{2514}', // └
        'n' => '\u{253c}', // ┼
        'o' => '\u{23ba}', // ⎺
        'p' => '\u{23bb}', // ⎻
        'q' => '\u{2500}', // ─
        'r' => '\u{23bc}', // ⎼
        's' => '\u{23bd}', // ⎽
        't' => '\u{251c}', // ├
        'u' => '\u{2524}', // ┤
        'v' => '\u{2534}', // ┴
        'w' => '\u{252c}', // ┬
        'x' => '\u{2502}', // │
        'y' => '\u{2264}', // ≤
        'z' => '\u{2265}', // ≥
        '{' => '\u{03c0}', // π
        '|' => '\u{2260}', // ≠
        '}' => '\u{00a3}', // £
        '~' => '\u{00b7}', // ·
        _ => ch,
    }
}
