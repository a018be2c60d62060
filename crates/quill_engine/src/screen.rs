use std::collections::{BTreeSet, HashSet};

use quill_parser_core::{AnsiColor, CharsetSlot, DeviceStatusReport, EraseInDisplayMode, EraseInLineMode, SgrAttribute};
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization;
use unicode_width::UnicodeWidthChar;

use crate::{modes, Caret, Cell, CellFlags, Charset, Line, Margins, Savepoint, TermColor, XTERM_256_PALETTE};

/// An in-memory matrix of styled characters tracking cursor, margins,
/// modes, tab stops and charsets. It mutates synchronously in response to
/// commands dispatched by the parser and records which rows need repaint
/// in [`Screen::dirty`].
///
/// Lines and columns are 0-indexed internally; the 1-based addressing of
/// the wire protocol is normalized at the operation boundary.
pub struct Screen {
    columns: usize,
    lines: usize,
    pub(crate) buffer: Vec<Line>,
    /// Rows that must be repainted. Cleared by the consumer.
    pub dirty: HashSet<usize>,
    pub cursor: Caret,
    savepoints: Vec<Savepoint>,
    mode: HashSet<u32>,
    margins: Margins,
    tab_stops: BTreeSet<usize>,
    g0_charset: Charset,
    g1_charset: Charset,
    charset: usize,
    title: String,
    icon_name: String,
    // Device-report responses waiting to be written to the child.
    process_input: Vec<u8>,
    // Rows that scrolled out of the region, staged for a scrollback
    // owner. Without one (`record_scrolled` off) they are dropped.
    pub(crate) record_scrolled: bool,
    pub(crate) scrolled_off_top: Vec<Line>,
    pub(crate) scrolled_off_bottom: Vec<Line>,
}

impl Screen {
    pub fn new(columns: usize, lines: usize) -> Self {
        let mut screen = Screen {
            columns,
            lines,
            buffer: Vec::new(),
            dirty: HashSet::new(),
            cursor: Caret::default(),
            savepoints: Vec::new(),
            mode: HashSet::new(),
            margins: Margins { top: 0, bottom: lines.saturating_sub(1) },
            tab_stops: BTreeSet::new(),
            g0_charset: Charset::Lat1,
            g1_charset: Charset::Vt100,
            charset: 0,
            title: String::new(),
            icon_name: String::new(),
            process_input: Vec::new(),
            record_scrolled: false,
            scrolled_off_top: Vec::new(),
            scrolled_off_bottom: Vec::new(),
        };
        screen.reset();
        screen
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon_name(&self) -> &str {
        &self.icon_name
    }

    pub fn has_mode(&self, mode: u32) -> bool {
        self.mode.contains(&mode)
    }

    pub fn line(&self, y: usize) -> Option<&Line> {
        self.buffer.get(y)
    }

    pub fn tab_stops(&self) -> &BTreeSet<usize> {
        &self.tab_stops
    }

    /// Reset the terminal to its initial state: full-height margins, home
    /// cursor with default attributes, cleared buffer, charsets back to
    /// LAT1/VT100, tab stops every eight columns, DECAWM and DECTCEM on.
    pub fn reset(&mut self) {
        self.dirty.extend(0..self.lines);
        self.buffer.clear();
        self.buffer.resize(self.lines, Line::default());
        self.mode = HashSet::from([modes::DECAWM, modes::DECTCEM]);
        self.margins = Margins { top: 0, bottom: self.lines.saturating_sub(1) };

        self.title.clear();
        self.icon_name.clear();

        self.charset = 0;
        self.g0_charset = Charset::Lat1;
        self.g1_charset = Charset::Vt100;

        self.reset_tab_stops();

        self.scrolled_off_top.clear();
        self.scrolled_off_bottom.clear();

        self.cursor = Caret::default();
        self.cursor_position(0, 0);
    }

    fn reset_tab_stops(&mut self) {
        self.tab_stops = (8..self.columns).step_by(8).collect();
    }

    /// Resize the screen. Shrinking clips lines at the top (through
    /// `delete_lines`, bracketed by a cursor save/restore) and columns at
    /// the right; growing adds blank space at the bottom/right. Margins
    /// are reset to the full screen and origin mode is cleared.
    pub fn resize(&mut self, lines: usize, columns: usize) {
        self.dirty.extend(0..self.lines);
        let lines = lines.max(1);
        let columns = columns.max(1);

        if self.lines > lines {
            let diff = self.lines - lines;
            self.save_cursor();
            self.cursor_position(0, 0);
            self.delete_lines(diff);
            self.restore_cursor();
        }

        if self.columns > columns {
            for line in &mut self.buffer {
                line.cells.truncate(columns);
            }
        }

        self.lines = lines;
        self.columns = columns;
        self.buffer.resize(lines, Line::default());
        self.reset_tab_stops();

        self.margins = Margins { top: 0, bottom: self.lines - 1 };
        self.reset_mode(&[modes::DECOM], false);
    }

    /// Select the scrolling region. Input is 1-based; `(0, 0)` (an empty
    /// DECSTBM) restores full-screen margins. A region narrower than two
    /// rows is ignored, and a successful change homes the cursor.
    pub fn set_margins(&mut self, top: u16, bottom: u16) {
        if top == 0 && bottom == 0 {
            self.margins = Margins { top: 0, bottom: self.lines - 1 };
            return;
        }

        let top = (top as usize).saturating_sub(1).min(self.lines - 1);
        let bottom = (bottom as usize).saturating_sub(1).min(self.lines - 1);

        if bottom > top {
            self.margins = Margins { top, bottom };
            self.cursor_position(0, 0);
        }
    }

    /// Enable modes. `private` shifts the codes into the DEC private
    /// range first.
    pub fn set_mode(&mut self, new_modes: &[u32], private: bool) {
        let shifted: Vec<u32> = if private {
            let shifted: Vec<u32> = new_modes.iter().map(|m| m << modes::PRIVATE_MODE_SHIFT).collect();
            if shifted.contains(&modes::DECSCNM) {
                self.dirty.extend(0..self.lines);
            }
            shifted
        } else {
            new_modes.to_vec()
        };

        self.mode.extend(shifted.iter().copied());

        // DECCOLM forces the wide display, erases the screen and homes
        // the cursor.
        if shifted.contains(&modes::DECCOLM) {
            self.resize(self.lines, 132);
            self.erase_in_display(EraseInDisplayMode::All);
            self.cursor_position(0, 0);
        }

        if shifted.contains(&modes::DECOM) {
            self.cursor_position(0, 0);
        }

        if shifted.contains(&modes::DECSCNM) {
            for line in &mut self.buffer {
                for cell in &mut line.cells {
                    cell.flags.insert(CellFlags::REVERSE);
                }
            }
            self.select_graphic_rendition(SgrAttribute::Reverse(true));
        }

        if shifted.contains(&modes::DECTCEM) {
            self.cursor.hidden = false;
        }
    }

    /// Disable modes; the inverse of [`Screen::set_mode`].
    pub fn reset_mode(&mut self, old_modes: &[u32], private: bool) {
        let shifted: Vec<u32> = if private {
            let shifted: Vec<u32> = old_modes.iter().map(|m| m << modes::PRIVATE_MODE_SHIFT).collect();
            if shifted.contains(&modes::DECSCNM) {
                self.dirty.extend(0..self.lines);
            }
            shifted
        } else {
            old_modes.to_vec()
        };

        for mode in &shifted {
            self.mode.remove(mode);
        }

        if shifted.contains(&modes::DECCOLM) {
            self.resize(self.lines, 80);
            self.erase_in_display(EraseInDisplayMode::All);
            self.cursor_position(0, 0);
        }

        if shifted.contains(&modes::DECOM) {
            self.cursor_position(0, 0);
        }

        if shifted.contains(&modes::DECSCNM) {
            for line in &mut self.buffer {
                for cell in &mut line.cells {
                    cell.flags.remove(CellFlags::REVERSE);
                }
            }
            self.select_graphic_rendition(SgrAttribute::Reverse(false));
        }

        if shifted.contains(&modes::DECTCEM) {
            self.cursor.hidden = true;
        }
    }

    /// Define the G0 or G1 charset; unknown codes are ignored.
    pub fn define_charset(&mut self, slot: CharsetSlot, code: char) {
        if let Some(charset) = Charset::from_code(code) {
            match slot {
                CharsetSlot::G0 => self.g0_charset = charset,
                CharsetSlot::G1 => self.g1_charset = charset,
            }
        }
    }

    /// Select the G0 character set.
    pub fn shift_in(&mut self) {
        self.charset = 0;
    }

    /// Select the G1 character set.
    pub fn shift_out(&mut self) {
        self.charset = 1;
    }

    /// Display text at the cursor, honoring the active charset, DECAWM,
    /// IRM and character width. Wide characters occupy two cells (the
    /// second a space stub); combining marks are NFC-composed onto the
    /// previously written cell, possibly on the previous row.
    pub fn draw(&mut self, data: &str) {
        let active = if self.charset == 1 { self.g1_charset } else { self.g0_charset };

        for ch in data.chars() {
            let ch = active.translate(ch);
            let char_width = ch.width();

            // At the right edge either wrap to the next row or overwrite
            // the last cell.
            if self.cursor.pos.x == self.columns {
                if self.has_mode(modes::DECAWM) {
                    self.dirty.insert(self.cursor.pos.y);
                    self.carriage_return();
                    self.linefeed();
                } else if let Some(width) = char_width {
                    if width > 0 {
                        self.cursor.pos.x -= width.min(self.cursor.pos.x);
                    }
                }
            }

            if self.has_mode(modes::IRM) {
                if let Some(width) = char_width {
                    if width > 0 {
                        self.insert_characters(width);
                    }
                }
            }

            let x = self.cursor.pos.x;
            let y = self.cursor.pos.y;
            match char_width {
                Some(1) => {
                    let cell = self.cursor.attrs.with_data(&ch.to_string());
                    self.buffer[y].set(x, cell);
                }
                Some(2) => {
                    let cell = self.cursor.attrs.with_data(&ch.to_string());
                    self.buffer[y].set(x, cell);
                    if x + 1 < self.columns {
                        let stub = self.cursor.attrs.with_data(" ");
                        self.buffer[y].set(x + 1, stub);
                    }
                }
                Some(0) if canonical_combining_class(ch) != 0 => {
                    // Combine with the last written cell.
                    if x > 0 {
                        let last = self.buffer[y].cell_at(x - 1).clone();
                        let composed: String = format!("{}{}", last.data, ch).nfc().collect();
                        self.buffer[y].set(x - 1, last.with_data(&composed));
                    } else if y > 0 {
                        let last = self.buffer[y - 1].cell_at(self.columns - 1).clone();
                        let composed: String = format!("{}{}", last.data, ch).nfc().collect();
                        self.buffer[y - 1].set(self.columns - 1, last.with_data(&composed));
                    }
                }
                // Unprintable, or zero-width without a combining class.
                _ => break,
            }

            if let Some(width) = char_width {
                if width > 0 {
                    self.cursor.pos.x = (x + width).min(self.columns);
                }
            }
        }

        self.dirty.insert(self.cursor.pos.y);
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn set_icon_name(&mut self, icon_name: &str) {
        self.icon_name = icon_name.to_string();
    }

    /// Audible bell. A noop at this layer; sessions may surface it.
    pub fn bell(&mut self) {}

    pub fn carriage_return(&mut self) {
        self.cursor.pos.x = 0;
    }

    /// Move the cursor down one row; at the bottom margin the region
    /// scrolls up instead.
    pub fn index(&mut self) {
        if self.cursor.pos.y == self.margins.bottom {
            self.dirty.extend(0..self.lines);
        }

        let Margins { top, bottom } = self.margins;

        if self.cursor.pos.y == bottom {
            if self.record_scrolled {
                self.scrolled_off_top.push(self.buffer[top].clone());
            }
            for line in top..bottom {
                self.buffer[line] = std::mem::take(&mut self.buffer[line + 1]);
            }
            self.buffer[bottom] = Line::default();
        } else {
            self.cursor_down(1);
        }
    }

    /// Move the cursor up one row; at the top margin the region scrolls
    /// down instead.
    pub fn reverse_index(&mut self) {
        if self.cursor.pos.y == self.margins.top {
            self.dirty.extend(0..self.lines);
        }

        let Margins { top, bottom } = self.margins;

        if self.cursor.pos.y == top {
            if self.record_scrolled {
                self.scrolled_off_bottom.push(self.buffer[bottom].clone());
            }
            for line in ((top + 1)..=bottom).rev() {
                self.buffer[line] = std::mem::take(&mut self.buffer[line - 1]);
            }
            self.buffer[top] = Line::default();
        } else {
            self.cursor_up(1);
        }
    }

    /// Index, plus a carriage return when LNM is set.
    pub fn linefeed(&mut self) {
        self.index();
        if self.has_mode(modes::LNM) {
            self.carriage_return();
        }
    }

    /// Move to the next tab stop, or the last column if none remain.
    pub fn tab(&mut self) {
        let column = self
            .tab_stops
            .range((self.cursor.pos.x + 1)..)
            .next()
            .copied()
            .unwrap_or(self.columns - 1);
        self.cursor.pos.x = column;
    }

    pub fn backspace(&mut self) {
        self.cursor_back(1);
    }

    /// Push cursor position, charset state, origin and wrap flags onto the
    /// savepoint stack.
    pub fn save_cursor(&mut self) {
        self.savepoints.push(Savepoint {
            caret: self.cursor.clone(),
            g0_charset: self.g0_charset,
            g1_charset: self.g1_charset,
            charset: self.charset,
            origin: self.has_mode(modes::DECOM),
            wrap: self.has_mode(modes::DECAWM),
        });
    }

    /// Pop the most recent savepoint. With an empty stack the cursor moves
    /// home and origin mode is reset.
    pub fn restore_cursor(&mut self) {
        match self.savepoints.pop() {
            Some(savepoint) => {
                self.g0_charset = savepoint.g0_charset;
                self.g1_charset = savepoint.g1_charset;
                self.charset = savepoint.charset;

                if savepoint.origin {
                    self.set_mode(&[modes::DECOM], false);
                }
                if savepoint.wrap {
                    self.set_mode(&[modes::DECAWM], false);
                }

                self.cursor = savepoint.caret;
                self.ensure_hbounds();
                self.ensure_vbounds(true);
            }
            None => {
                self.reset_mode(&[modes::DECOM], false);
                self.cursor_position(0, 0);
            }
        }
    }

    /// Insert blank rows at the cursor inside the scrolling region; rows
    /// pushed past the bottom margin are lost.
    pub fn insert_lines(&mut self, count: usize) {
        self.dirty.extend(self.cursor.pos.y..self.lines);
        let count = count.max(1);
        let Margins { top, bottom } = self.margins;

        if (top..=bottom).contains(&self.cursor.pos.y) {
            for y in (self.cursor.pos.y..=bottom).rev() {
                if y + count <= bottom && !self.buffer[y].is_empty() {
                    self.buffer[y + count] = std::mem::take(&mut self.buffer[y]);
                } else {
                    self.buffer[y] = Line::default();
                }
            }
            self.carriage_return();
        }
    }

    /// Delete rows at the cursor inside the scrolling region; rows below
    /// move up and blank rows appear at the bottom margin.
    pub fn delete_lines(&mut self, count: usize) {
        self.dirty.extend(self.cursor.pos.y..self.lines);
        let count = count.max(1);
        let Margins { top, bottom } = self.margins;

        if (top..=bottom).contains(&self.cursor.pos.y) {
            for y in self.cursor.pos.y..=bottom {
                if y + count <= bottom {
                    if !self.buffer[y + count].is_empty() {
                        self.buffer[y] = std::mem::take(&mut self.buffer[y + count]);
                    }
                } else {
                    self.buffer[y] = Line::default();
                }
            }
            self.carriage_return();
        }
    }

    /// Insert blank cells at the cursor; the cursor does not move.
    pub fn insert_characters(&mut self, count: usize) {
        self.dirty.insert(self.cursor.pos.y);
        let count = count.max(1);
        let x = self.cursor.pos.x;
        let columns = self.columns;

        let line = &mut self.buffer[self.cursor.pos.y];
        if line.cells.len() > x {
            for _ in 0..count {
                line.cells.insert(x, Cell::default());
            }
            line.cells.truncate(columns);
        }
    }

    /// Delete cells at the cursor; the remainder of the row shifts left.
    pub fn delete_characters(&mut self, count: usize) {
        self.dirty.insert(self.cursor.pos.y);
        let count = count.max(1);
        let x = self.cursor.pos.x;

        let line = &mut self.buffer[self.cursor.pos.y];
        if line.cells.len() > x {
            let end = (x + count).min(line.cells.len());
            line.cells.drain(x..end);
        }
    }

    /// Overwrite cells at the cursor with the cursor attributes; the
    /// cursor does not move.
    pub fn erase_characters(&mut self, count: usize) {
        self.dirty.insert(self.cursor.pos.y);
        let count = count.max(1);

        let y = self.cursor.pos.y;
        for x in self.cursor.pos.x..(self.cursor.pos.x + count).min(self.columns) {
            let cell = self.cursor.attrs.clone();
            self.buffer[y].set(x, cell);
        }
    }

    pub fn erase_in_line(&mut self, how: EraseInLineMode) {
        self.dirty.insert(self.cursor.pos.y);
        let interval = match how {
            EraseInLineMode::CursorToEnd => self.cursor.pos.x..self.columns,
            EraseInLineMode::StartToCursor => 0..(self.cursor.pos.x + 1),
            EraseInLineMode::All => 0..self.columns,
        };

        let y = self.cursor.pos.y;
        for x in interval {
            let cell = self.cursor.attrs.clone();
            self.buffer[y].set(x, cell);
        }
    }

    /// Erase part of the display. Rows other than the cursor row only have
    /// their already-written cells repainted; for the to-end/to-start
    /// variants the cursor row itself is handled by a trailing
    /// [`Screen::erase_in_line`] (and excluded from the row interval).
    pub fn erase_in_display(&mut self, how: EraseInDisplayMode) {
        let interval = match how {
            EraseInDisplayMode::CursorToEnd => {
                self.dirty.extend((self.cursor.pos.y + 1)..self.lines);
                (self.cursor.pos.y + 1)..self.lines
            }
            EraseInDisplayMode::StartToCursor => {
                self.dirty.extend(0..self.cursor.pos.y);
                0..self.cursor.pos.y
            }
            EraseInDisplayMode::All | EraseInDisplayMode::AllAndScrollback => {
                self.dirty.extend(0..self.lines);
                0..self.lines
            }
        };

        for y in interval {
            let attrs = self.cursor.attrs.clone();
            for cell in &mut self.buffer[y].cells {
                *cell = attrs.clone();
            }
        }

        match how {
            EraseInDisplayMode::CursorToEnd => self.erase_in_line(EraseInLineMode::CursorToEnd),
            EraseInDisplayMode::StartToCursor => self.erase_in_line(EraseInLineMode::StartToCursor),
            _ => {}
        }
    }

    pub fn set_tab_stop(&mut self) {
        self.tab_stops.insert(self.cursor.pos.x);
    }

    /// Clear the tab stop under the cursor (`how == 0`) or all tab stops
    /// (`how == 3`).
    pub fn clear_tab_stop(&mut self, how: u16) {
        match how {
            0 => {
                self.tab_stops.remove(&self.cursor.pos.x);
            }
            3 => self.tab_stops.clear(),
            _ => {}
        }
    }

    fn ensure_hbounds(&mut self) {
        self.cursor.pos.x = self.cursor.pos.x.min(self.columns - 1);
    }

    fn ensure_vbounds(&mut self, use_margins: bool) {
        let (top, bottom) = if use_margins || self.has_mode(modes::DECOM) {
            (self.margins.top, self.margins.bottom)
        } else {
            (0, self.lines - 1)
        };
        self.cursor.pos.y = self.cursor.pos.y.clamp(top, bottom);
    }

    /// Move up, stopping at the top margin.
    pub fn cursor_up(&mut self, count: usize) {
        let count = count.max(1);
        self.cursor.pos.y = self.cursor.pos.y.saturating_sub(count).max(self.margins.top);
    }

    /// Move up to column 0.
    pub fn cursor_up1(&mut self, count: usize) {
        self.cursor_up(count);
        self.carriage_return();
    }

    /// Move down, stopping at the bottom margin.
    pub fn cursor_down(&mut self, count: usize) {
        let count = count.max(1);
        self.cursor.pos.y = (self.cursor.pos.y + count).min(self.margins.bottom);
    }

    /// Move down to column 0.
    pub fn cursor_down1(&mut self, count: usize) {
        self.cursor_down(count);
        self.carriage_return();
    }

    /// Move left, stopping at the left edge.
    pub fn cursor_back(&mut self, count: usize) {
        // When the last draw filled the final column the position already
        // sits one past the edge.
        if self.cursor.pos.x == self.columns {
            self.cursor.pos.x -= 1;
        }
        let count = count.max(1);
        self.cursor.pos.x = self.cursor.pos.x.saturating_sub(count);
        self.ensure_hbounds();
    }

    /// Move right, stopping at the right edge.
    pub fn cursor_forward(&mut self, count: usize) {
        let count = count.max(1);
        self.cursor.pos.x += count;
        self.ensure_hbounds();
    }

    /// Absolute cursor addressing, 1-based (0 selects the default row or
    /// column). Under DECOM the row is relative to the top margin and the
    /// cursor cannot leave the scrolling region.
    pub fn cursor_position(&mut self, line: u16, column: u16) {
        let column = (column.max(1) as usize) - 1;
        let mut line = (line.max(1) as usize) - 1;

        if self.has_mode(modes::DECOM) {
            line += self.margins.top;
            if !(self.margins.top..=self.margins.bottom).contains(&line) {
                return;
            }
        }

        self.cursor.pos.x = column;
        self.cursor.pos.y = line;
        self.ensure_hbounds();
        self.ensure_vbounds(false);
    }

    pub fn cursor_to_column(&mut self, column: u16) {
        self.cursor.pos.x = (column.max(1) as usize) - 1;
        self.ensure_hbounds();
    }

    pub fn cursor_to_line(&mut self, line: u16) {
        self.cursor.pos.y = (line.max(1) as usize) - 1;

        if self.has_mode(modes::DECOM) {
            self.cursor.pos.y += self.margins.top;
        }

        self.ensure_vbounds(false);
    }

    /// DECALN: fill the screen with uppercase E's, keeping each cell's
    /// existing style.
    pub fn alignment_display(&mut self) {
        self.dirty.extend(0..self.lines);
        for y in 0..self.lines {
            for x in 0..self.columns {
                let cell = self.buffer[y].cell_at(x).with_data("E");
                self.buffer[y].set(x, cell);
            }
        }
    }

    /// Fold one SGR attribute into the cursor's attribute template.
    pub fn select_graphic_rendition(&mut self, attr: SgrAttribute) {
        let attrs = &mut self.cursor.attrs;
        match attr {
            SgrAttribute::Reset => *attrs = Cell::default(),
            SgrAttribute::Bold(on) => attrs.flags.set(CellFlags::BOLD, on),
            SgrAttribute::Italics(on) => attrs.flags.set(CellFlags::ITALICS, on),
            SgrAttribute::Underscore(on) => attrs.flags.set(CellFlags::UNDERSCORE, on),
            SgrAttribute::Strikethrough(on) => attrs.flags.set(CellFlags::STRIKETHROUGH, on),
            SgrAttribute::Reverse(on) => attrs.flags.set(CellFlags::REVERSE, on),
            SgrAttribute::Foreground(color) => attrs.fg = Self::resolve_color(color),
            SgrAttribute::Background(color) => attrs.bg = Self::resolve_color(color),
        }
    }

    fn resolve_color(color: AnsiColor) -> TermColor {
        match color {
            AnsiColor::Default => TermColor::Default,
            AnsiColor::Named(named) => TermColor::Named(named),
            AnsiColor::Extended(index) => XTERM_256_PALETTE[index as usize],
            AnsiColor::Rgb(r, g, b) => TermColor::Rgb(r, g, b),
        }
    }

    /// Primary DA: answer as a VT102.
    pub fn report_device_attributes(&mut self, mode: u16) {
        if mode == 0 {
            self.write_process_input("\x1b[?6c");
        }
    }

    /// DSR: operating status or cursor position report. The position is
    /// 1-based and, under DECOM, relative to the top margin.
    pub fn report_device_status(&mut self, report: DeviceStatusReport) {
        match report {
            DeviceStatusReport::OperatingStatus => {
                self.write_process_input("\x1b[0n");
            }
            DeviceStatusReport::CursorPosition => {
                let x = self.cursor.pos.x + 1;
                let mut y = self.cursor.pos.y + 1;
                if self.has_mode(modes::DECOM) {
                    y -= self.margins.top;
                }
                self.write_process_input(&format!("\x1b[{y};{x}R"));
            }
        }
    }

    /// Queue bytes for the process running inside the terminal; the
    /// session loop drains them into the PTY.
    pub fn write_process_input(&mut self, data: &str) {
        self.process_input.extend_from_slice(data.as_bytes());
    }

    pub fn take_process_input(&mut self) -> Option<Vec<u8>> {
        if self.process_input.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.process_input))
        }
    }

    /// Render one row as a display string of width `columns`. The stub
    /// cell after a full-width character is skipped; combining chunks ride
    /// along with their base cell.
    pub fn display_line(&self, y: usize) -> String {
        let mut rendered = String::with_capacity(self.columns);
        let mut skip_stub = false;
        for x in 0..self.columns {
            if skip_stub {
                skip_stub = false;
                continue;
            }
            let data = &self.buffer[y].cell_at(x).data;
            skip_stub = data.chars().next().map(|ch| ch.width() == Some(2)).unwrap_or(false);
            rendered.push_str(data);
        }
        rendered
    }

    /// All screen rows as display strings.
    pub fn display(&self) -> Vec<String> {
        (0..self.lines).map(|y| self.display_line(y)).collect()
    }
}
