//! Terminal mode bits.
//!
//! ANSI and DEC private mode numbers collide; private codes are stored
//! shifted left by [`PRIVATE_MODE_SHIFT`] so one set can hold both. The
//! DEC constants below are pre-shifted; `Screen::set_mode` shifts raw
//! codes arriving with the private flag, which also keeps unlisted
//! private modes (e.g. bracketed paste) queryable.

pub const PRIVATE_MODE_SHIFT: u32 = 5;

/// LNM - Line Feed/New Line Mode: linefeed implies carriage return.
pub const LNM: u32 = 20;
/// IRM - Insert/Replace Mode: new characters shift existing ones right.
pub const IRM: u32 = 4;

/// DECCKM - Application Cursor Keys.
pub const DECCKM: u32 = 1 << PRIVATE_MODE_SHIFT;
/// DECCOLM - 132/80 column switch; the screen is erased on change.
pub const DECCOLM: u32 = 3 << PRIVATE_MODE_SHIFT;
/// DECSCNM - reverse video for the whole screen.
pub const DECSCNM: u32 = 5 << PRIVATE_MODE_SHIFT;
/// DECOM - origin mode: cursor addressing relative to the scroll region.
pub const DECOM: u32 = 6 << PRIVATE_MODE_SHIFT;
/// DECAWM - auto wrap at the right margin.
pub const DECAWM: u32 = 7 << PRIVATE_MODE_SHIFT;
/// DECTCEM - text cursor enable (visibility).
pub const DECTCEM: u32 = 25 << PRIVATE_MODE_SHIFT;
/// Bracketed paste (xterm private mode 2004).
pub const BRACKETED_PASTE: u32 = 2004 << PRIVATE_MODE_SHIFT;
