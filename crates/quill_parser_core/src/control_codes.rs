//! C0 control characters recognized by the parser.

pub const BEL: char = '\u{07}';
pub const BS: char = '\u{08}';
pub const HT: char = '\u{09}';
pub const LF: char = '\u{0A}';
pub const VT: char = '\u{0B}';
pub const FF: char = '\u{0C}';
pub const CR: char = '\u{0D}';
pub const SO: char = '\u{0E}';
pub const SI: char = '\u{0F}';
pub const CAN: char = '\u{18}';
pub const SUB: char = '\u{1A}';
pub const ESC: char = '\u{1B}';
pub const DEL: char = '\u{7F}';
pub const NUL: char = '\u{00}';
/// Single-byte CSI (0x9B), equivalent to `ESC [`.
pub const CSI: char = '\u{9B}';
