use std::collections::{BTreeMap, HashMap};

use quill_parser_core::{AnsiParser, CommandParser, NamedColor};

use crate::{modes, ByteDecoder, Cell, CellFlags, HistoryScreen, Line, ScreenSink, TermColor};

/// A coalesced run of equally-colored cells within one row; `color` is
/// the effective `(background, foreground)` pair after the reverse-video
/// swap and default-color mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRun {
    pub color: (TermColor, TermColor),
    pub field_length: usize,
}

/// Colors equal to the baseline are not reported; the view renders on
/// black and white by default.
const BASELINE: (TermColor, TermColor) = (TermColor::Named(NamedColor::Black), TermColor::Named(NamedColor::White));

/// The emulator facade: one decoder chain, one parser and one history
/// screen. Bytes go in through [`TerminalEmulator::feed`]; rendered dirty
/// lines, color runs and the cursor come out.
pub struct TerminalEmulator {
    screen: HistoryScreen,
    parser: AnsiParser,
    decoder: ByteDecoder,
    modified: bool,
}

impl TerminalEmulator {
    /// `history` is the number of scrollback lines visible to the user;
    /// it is doubled internally because the two history queues split the
    /// configured budget between them.
    pub fn new(columns: usize, lines: usize, history: usize, ratio: f32) -> Self {
        TerminalEmulator {
            screen: HistoryScreen::new(columns, lines, history * 2, ratio),
            parser: AnsiParser::new(),
            decoder: ByteDecoder::default(),
            modified: true,
        }
    }

    /// Push child-process output through decode and parse into the
    /// screen. Any scrolled-back view snaps to the live screen first.
    pub fn feed(&mut self, data: &[u8]) {
        self.screen.scroll_to_bottom();
        let text = self.decoder.feed(data);
        let mut sink = ScreenSink::new(&mut self.screen);
        self.parser.parse(&text, &mut sink);
        self.modified = true;
    }

    pub fn resize(&mut self, lines: usize, columns: usize) {
        self.screen.scroll_to_bottom();
        let dirty_lines = lines.max(self.screen.lines());
        self.screen.dirty.extend(0..dirty_lines);
        self.modified = true;
        self.screen.resize(lines, columns);
    }

    pub fn prev_page(&mut self) {
        self.screen.prev_page();
        self.screen.ensure_screen_width();
        self.modified = true;
    }

    pub fn next_page(&mut self) {
        self.screen.next_page();
        self.screen.ensure_screen_width();
        self.modified = true;
    }

    pub fn prev_line(&mut self) {
        self.screen.prev_line();
        self.screen.ensure_screen_width();
        self.modified = true;
    }

    pub fn next_line(&mut self) {
        self.screen.next_line();
        self.screen.ensure_screen_width();
        self.modified = true;
    }

    /// Rows needing repaint, rendered to display strings. Rows that fell
    /// off the bottom after a shrink map to `None`: the view should
    /// delete them.
    pub fn dirty_lines(&self) -> BTreeMap<usize, Option<String>> {
        let mut result = BTreeMap::new();
        for &line in &self.screen.dirty {
            if line >= self.screen.lines() {
                result.insert(line, None);
            } else {
                result.insert(line, Some(self.screen.display_line(line)));
            }
        }
        result
    }

    pub fn clear_dirty(&mut self) {
        self.modified = false;
        self.screen.dirty.clear();
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    /// Cursor position as `(row, column)`.
    pub fn cursor(&self) -> (usize, usize) {
        (self.screen.cursor.pos.y, self.screen.cursor.pos.x)
    }

    pub fn cursor_is_hidden(&self) -> bool {
        self.screen.cursor.hidden
    }

    pub fn lines(&self) -> usize {
        self.screen.lines()
    }

    pub fn columns(&self) -> usize {
        self.screen.columns()
    }

    pub fn display(&self) -> Vec<String> {
        self.screen.display()
    }

    /// Coalesce the requested rows into per-row color runs, keyed by
    /// start column. Only runs differing from the black-on-white baseline
    /// are reported.
    pub fn color_map(&self, rows: impl IntoIterator<Item = usize>) -> HashMap<usize, BTreeMap<usize, ColorRun>> {
        let mut color_map = HashMap::new();

        for row in rows {
            let Some(line) = self.screen.line(row) else {
                // Rows outside the buffer after a resize render blank.
                continue;
            };
            if line.is_empty() {
                continue;
            }

            let runs = coalesce_runs(line);
            if !runs.is_empty() {
                color_map.insert(row, runs);
            }
        }

        color_map
    }

    /// Device-report responses waiting to be written back to the child.
    pub fn take_process_input(&mut self) -> Option<Vec<u8>> {
        self.screen.take_process_input()
    }

    /// DECCKM: arrow keys use the application encoding.
    pub fn application_mode_enabled(&self) -> bool {
        self.screen.has_mode(modes::DECCKM)
    }

    /// xterm private mode 2004.
    pub fn bracketed_paste_mode_enabled(&self) -> bool {
        self.screen.has_mode(modes::BRACKETED_PASTE)
    }

    /// Blank out a row range (used by the host's clear command).
    pub fn clear_rows(&mut self, start: usize, end: usize) {
        let end = end.min(self.screen.lines());
        for y in start..end {
            self.screen.buffer[y] = Line::default();
            self.screen.dirty.insert(y);
        }
        self.modified = true;
    }
}

/// The effective `(bg, fg)` of a cell: defaults map to black/white and
/// reverse video swaps the pair.
fn effective_color(cell: &Cell) -> (TermColor, TermColor) {
    let bg = match cell.bg {
        TermColor::Default => TermColor::Named(NamedColor::Black),
        other => other,
    };
    let fg = match cell.fg {
        TermColor::Default => TermColor::Named(NamedColor::White),
        other => other,
    };

    if cell.has_flag(CellFlags::REVERSE) {
        (fg, bg)
    } else {
        (bg, fg)
    }
}

fn coalesce_runs(line: &Line) -> BTreeMap<usize, ColorRun> {
    let mut runs = BTreeMap::new();
    let mut last_color = None;
    let mut last_index = 0;
    let mut field_length = 0;

    for (x, cell) in line.cells.iter().enumerate() {
        let color = effective_color(cell);
        if last_color == Some(color) {
            field_length += 1;
        } else {
            if let Some(color) = last_color {
                if color != BASELINE {
                    runs.insert(last_index, ColorRun { color, field_length });
                }
            }
            last_color = Some(color);
            last_index = x;
            field_length = 1;
        }
    }

    if let Some(color) = last_color {
        if color != BASELINE {
            runs.insert(last_index, ColorRun { color, field_length });
        }
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn emulator() -> TerminalEmulator {
        TerminalEmulator::new(80, 24, 100, 0.5)
    }

    #[test]
    fn plain_write() {
        let mut emulator = emulator();
        emulator.clear_dirty();
        emulator.feed(b"hello");

        let dirty = emulator.dirty_lines();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[&0], Some(format!("hello{}", " ".repeat(75))));
        assert_eq!(emulator.cursor(), (0, 5));
        assert!(emulator.modified());
    }

    #[test]
    fn auto_wrap() {
        let mut emulator = TerminalEmulator::new(5, 2, 10, 0.5);
        emulator.clear_dirty();
        emulator.feed(b"abcdefg");

        let dirty = emulator.dirty_lines();
        assert_eq!(dirty[&0], Some("abcde".to_string()));
        assert_eq!(dirty[&1], Some("fg   ".to_string()));
        assert_eq!(emulator.cursor(), (1, 2));
        assert_eq!(dirty.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn cursor_position_report() {
        let mut emulator = emulator();
        emulator.feed(b"\x1b[10;5H\x1b[6n");
        assert_eq!(emulator.take_process_input(), Some(b"\x1b[10;5R".to_vec()));

        // With origin mode and margins the report is region-relative.
        emulator.feed(b"\x1b[3;20r\x1b[?6h\x1b[8;5H\x1b[6n");
        assert_eq!(emulator.take_process_input(), Some(b"\x1b[8;5R".to_vec()));
    }

    #[test]
    fn sgr_compose() {
        let mut emulator = emulator();
        emulator.feed(b"\x1b[31;1mX\x1b[0mY");

        let color_map = emulator.color_map([0]);
        let runs = &color_map[&0];
        assert_eq!(
            runs[&0],
            ColorRun {
                color: (TermColor::Named(NamedColor::Black), TermColor::Named(NamedColor::Red)),
                field_length: 1,
            }
        );
        // The second cell reverted to default attributes, which is the
        // baseline and therefore unreported.
        assert_eq!(runs.len(), 1);
    }

    #[test]
    fn history_pagination() {
        let mut emulator = TerminalEmulator::new(20, 10, 20, 0.5);
        for i in 0..25 {
            emulator.feed(format!("line{i}\r\n").as_bytes());
        }
        emulator.feed(b"\rlast");
        emulator.clear_dirty();

        emulator.prev_page();
        let display = emulator.display();
        assert!(display[0].starts_with("line11"));
        assert_eq!(emulator.dirty_lines().len(), 10);
        assert!(emulator.cursor_is_hidden());

        emulator.next_page();
        assert!(emulator.display()[9].starts_with("last"));
        assert!(!emulator.cursor_is_hidden());
    }

    #[test]
    fn typed_input_snaps_back_to_live_screen() {
        let mut emulator = TerminalEmulator::new(20, 5, 20, 0.5);
        for i in 0..15 {
            emulator.feed(format!("line{i}\r\n").as_bytes());
        }
        emulator.prev_page();
        let scrolled = emulator.display();

        emulator.feed(b"$ ");
        assert_ne!(emulator.display(), scrolled);
        assert!(emulator.display()[4].starts_with("$ "));
    }

    #[test]
    fn dirty_lines_flag_rows_beyond_a_shrunk_screen() {
        let mut emulator = TerminalEmulator::new(10, 4, 10, 0.5);
        emulator.feed(b"x");
        emulator.clear_dirty();

        emulator.resize(2, 10);
        let dirty = emulator.dirty_lines();
        assert!(dirty[&0].is_some());
        assert_eq!(dirty[&2], None);
        assert_eq!(dirty[&3], None);
    }

    #[test]
    fn mode_queries() {
        let mut emulator = emulator();
        assert!(!emulator.bracketed_paste_mode_enabled());
        assert!(!emulator.application_mode_enabled());

        emulator.feed(b"\x1b[?2004h\x1b[?1h");
        assert!(emulator.bracketed_paste_mode_enabled());
        assert!(emulator.application_mode_enabled());

        emulator.feed(b"\x1b[?2004l\x1b[?1l");
        assert!(!emulator.bracketed_paste_mode_enabled());
        assert!(!emulator.application_mode_enabled());
    }

    #[test]
    fn feeding_is_deterministic() {
        let stream: &[u8] = b"\x1b[2J\x1b[3;4Hok\x1b[31mred\x1b[0m\r\nnext";
        let run = || {
            let mut emulator = TerminalEmulator::new(20, 6, 10, 0.5);
            emulator.feed(stream);
            (emulator.display(), emulator.cursor())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn color_runs_round_trip_to_cells() {
        let mut emulator = TerminalEmulator::new(20, 2, 10, 0.5);
        emulator.feed(b"\x1b[41mab\x1b[44mcd\x1b[0me");

        let color_map = emulator.color_map([0]);
        let runs = &color_map[&0];

        // Reconstruct the row's effective colors from the runs and
        // compare against the cells.
        let line = emulator.screen.line(0).unwrap();
        let mut reconstructed = vec![BASELINE; line.cells.len()];
        for (&start, run) in runs {
            for x in start..start + run.field_length {
                reconstructed[x] = run.color.clone();
            }
        }
        for (x, cell) in line.cells.iter().enumerate() {
            assert_eq!(reconstructed[x], effective_color(cell), "column {x}");
        }
    }

    #[test]
    fn reverse_video_swaps_run_colors() {
        let mut emulator = TerminalEmulator::new(10, 1, 10, 0.5);
        emulator.feed(b"\x1b[7mrev");

        let color_map = emulator.color_map([0]);
        let run = &color_map[&0][&0];
        assert_eq!(
            run.color,
            (TermColor::Named(NamedColor::White), TermColor::Named(NamedColor::Black))
        );
    }

    #[test]
    fn clear_rows_blanks_a_range() {
        let mut emulator = TerminalEmulator::new(5, 4, 10, 0.5);
        emulator.feed(b"a\r\nb\r\nc\r\nd");
        emulator.clear_dirty();

        emulator.clear_rows(1, 3);
        assert_eq!(emulator.display()[1].trim_end(), "");
        assert_eq!(emulator.display()[2].trim_end(), "");
        assert_eq!(emulator.display()[0].trim_end(), "a");
        assert_eq!(emulator.dirty_lines().keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn decoder_fallback_reaches_the_screen() {
        let mut emulator = TerminalEmulator::new(10, 2, 10, 0.5);
        emulator.feed(&[0xC9, 0xCD, 0xBB]); // CP437 box drawing
        assert_eq!(emulator.display()[0].trim_end(), "╔═╗");
    }
}
