use bitflags::bitflags;

use crate::TermColor;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellFlags: u8 {
        const BOLD = 1 << 0;
        const ITALICS = 1 << 1;
        const UNDERSCORE = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
        const REVERSE = 1 << 4;
    }
}

/// A single styled on-screen character: one grapheme (one or two display
/// columns wide, possibly with combining marks folded in), its colors and
/// its style flags. Cells are values; edits replace the cell at a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub data: String,
    pub fg: TermColor,
    pub bg: TermColor,
    pub flags: CellFlags,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            data: " ".to_string(),
            fg: TermColor::Default,
            bg: TermColor::Default,
            flags: CellFlags::empty(),
        }
    }
}

impl Cell {
    /// A copy of this cell carrying `data` instead; colors and flags are
    /// kept. This is how the cursor's attribute template stamps characters
    /// onto the screen.
    pub fn with_data(&self, data: &str) -> Cell {
        Cell {
            data: data.to_string(),
            ..self.clone()
        }
    }

    pub fn has_flag(&self, flag: CellFlags) -> bool {
        self.flags.contains(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_cell_is_a_blank() {
        let cell = Cell::default();
        assert_eq!(cell.data, " ");
        assert_eq!(cell.fg, TermColor::Default);
        assert_eq!(cell.bg, TermColor::Default);
        assert!(cell.flags.is_empty());
    }

    #[test]
    fn with_data_keeps_style() {
        let mut template = Cell::default();
        template.fg = TermColor::Rgb(1, 2, 3);
        template.flags = CellFlags::BOLD;

        let stamped = template.with_data("x");
        assert_eq!(stamped.data, "x");
        assert_eq!(stamped.fg, TermColor::Rgb(1, 2, 3));
        assert!(stamped.has_flag(CellFlags::BOLD));
    }
}
