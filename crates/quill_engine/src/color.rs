use lazy_static::lazy_static;
use quill_parser_core::NamedColor;

/// A cell foreground or background color: the default sentinel, one of the
/// eight console color names, or a 24-bit value (also used for resolved
/// 256-palette lookups).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermColor {
    Default,
    Named(NamedColor),
    Rgb(u8, u8, u8),
}

impl Default for TermColor {
    fn default() -> Self {
        TermColor::Default
    }
}

impl TermColor {
    /// The color's display name: `"default"`, a console color name, or six
    /// lowercase hex digits.
    pub fn name(self) -> String {
        match self {
            TermColor::Default => "default".to_string(),
            TermColor::Named(color) => color.name().to_string(),
            TermColor::Rgb(r, g, b) => format!("{r:02x}{g:02x}{b:02x}"),
        }
    }
}

lazy_static! {
    /// The 256-color palette used for `38;5;n` / `48;5;n` lookups:
    /// 16 base entries, a 6x6x6 color cube and a grayscale ramp.
    pub static ref XTERM_256_PALETTE: [TermColor; 256] = build_palette();
}

fn build_palette() -> [TermColor; 256] {
    const BASE: [(u8, u8, u8); 16] = [
        (0x00, 0x00, 0x00),
        (0xcd, 0x00, 0x00),
        (0x00, 0xcd, 0x00),
        (0xcd, 0xcd, 0x00),
        (0x00, 0x00, 0xee),
        (0xcd, 0x00, 0xcd),
        (0x00, 0xcd, 0xcd),
        (0xe5, 0xe5, 0xe5),
        (0x7f, 0x7f, 0x7f),
        (0xff, 0x00, 0x00),
        (0x00, 0xff, 0x00),
        (0xff, 0xff, 0x00),
        (0x5c, 0x5c, 0xff),
        (0xff, 0x00, 0xff),
        (0x00, 0xff, 0xff),
        (0xff, 0xff, 0xff),
    ];
    const CUBE: [u8; 6] = [0x00, 0x5f, 0x87, 0xaf, 0xd7, 0xff];

    let mut palette = [TermColor::Default; 256];
    for (i, &(r, g, b)) in BASE.iter().enumerate() {
        palette[i] = TermColor::Rgb(r, g, b);
    }
    // The cube covers 16..=231; the grayscale ramp covers 232..=255,
    // running from 8 to 238 in steps of 10.
    for i in 0..216 {
        let r = CUBE[(i / 36) % 6];
        let g = CUBE[(i / 6) % 6];
        let b = CUBE[i % 6];
        palette[16 + i] = TermColor::Rgb(r, g, b);
    }
    for i in 0..24 {
        let v = (8 + i * 10) as u8;
        palette[232 + i] = TermColor::Rgb(v, v, v);
    }
    palette
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names() {
        assert_eq!(TermColor::Default.name(), "default");
        assert_eq!(TermColor::Named(NamedColor::Brown).name(), "brown");
        assert_eq!(TermColor::Rgb(0xcd, 0x00, 0x00).name(), "cd0000");
    }

    #[test]
    fn palette_base_and_ramp() {
        assert_eq!(XTERM_256_PALETTE[1], TermColor::Rgb(0xcd, 0x00, 0x00));
        assert_eq!(XTERM_256_PALETTE[16], TermColor::Rgb(0x00, 0x00, 0x00));
        assert_eq!(XTERM_256_PALETTE[196], TermColor::Rgb(0xff, 0x00, 0x00));
        // Last cube entry, then the first and last grayscale steps.
        assert_eq!(XTERM_256_PALETTE[231], TermColor::Rgb(0xff, 0xff, 0xff));
        assert_eq!(XTERM_256_PALETTE[232], TermColor::Rgb(8, 8, 8));
        assert_eq!(XTERM_256_PALETTE[255], TermColor::Rgb(0xee, 0xee, 0xee));
    }
}
