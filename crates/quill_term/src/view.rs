//! Painting emulator state into a host editor view.
//!
//! The host view is reached through [`TerminalHostView`]: a buffer of
//! text addressed by absolute character offsets, keyed color regions, a
//! cursor point and a read-only flag. [`ViewAdapter`] turns the
//! emulator's dirty lines into the minimal set of region operations,
//! keeping local caches of line contents and region keys so offsets are
//! computed without round-tripping through the host's (slow) point
//! arithmetic.

use std::collections::HashMap;

use quill_engine::TerminalEmulator;

/// Columns kept free at the right edge of the viewport.
pub const RIGHT_MARGIN_COLUMNS: usize = 2;
/// Rows kept free at the bottom of the viewport.
pub const BOTTOM_MARGIN_ROWS: usize = 0;

/// The surface a host editor exposes for one terminal view. All mutation
/// happens through the host's serialized command channel; the adapter
/// only ever calls these from the session worker.
pub trait TerminalHostView: Send {
    /// Pixel extent of the viewport as `(width, height)`.
    fn viewport_extent(&self) -> (f32, f32);
    fn line_height(&self) -> f32;
    fn em_width(&self) -> f32;

    /// Replace `[start, end)` (absolute character offsets) with `text`.
    fn replace_region(&mut self, start: usize, end: usize, text: &str);
    /// Erase `[start, end)`.
    fn erase_region(&mut self, start: usize, end: usize);

    fn add_color_region(&mut self, key: &str, start: usize, end: usize, scope: &str);
    fn erase_color_region(&mut self, key: &str);

    fn set_cursor(&mut self, point: usize);
    fn clear_cursor(&mut self);

    fn set_read_only(&mut self, read_only: bool);

    fn is_open(&self) -> bool;
    fn close(&mut self);
}

/// Local copy of the view's line contents. Kept in sync with every edit
/// the adapter makes, so start/end offsets come from summing cached line
/// lengths instead of querying the host.
#[derive(Default)]
struct ViewContentCache {
    lines: HashMap<usize, String>,
}

impl ViewContentCache {
    fn update_line(&mut self, line_no: usize, content: String) {
        self.lines.insert(line_no, content);
    }

    fn delete_line(&mut self, line_no: usize) {
        self.lines.remove(&line_no);
    }

    fn get_line(&self, line_no: usize) -> Option<&String> {
        self.lines.get(&line_no)
    }

    fn has_line(&self, line_no: usize) -> bool {
        self.lines.contains_key(&line_no)
    }

    /// `(start, end)` character offsets of a row, including its newline.
    fn line_span(&self, line_no: usize) -> (usize, usize) {
        let mut start = 0;
        for i in 0..line_no {
            if let Some(line) = self.lines.get(&i) {
                start += line.chars().count();
            }
        }

        let mut end = start;
        if let Some(line) = self.lines.get(&line_no) {
            end += line.chars().count();
        }

        (start, end)
    }
}

/// Region keys the adapter has added per row, so a repaint can drop
/// exactly the stale ones.
#[derive(Default)]
struct ViewRegionCache {
    regions: HashMap<usize, Vec<String>>,
}

impl ViewRegionCache {
    fn add(&mut self, line_no: usize, key: String) {
        self.regions.entry(line_no).or_default().push(key);
    }

    fn take_line(&mut self, line_no: usize) -> Vec<String> {
        self.regions.remove(&line_no).unwrap_or_default()
    }
}

pub struct ViewAdapter {
    content: ViewContentCache,
    regions: ViewRegionCache,
    last_cursor: Option<usize>,
    show_colors: bool,
}

impl ViewAdapter {
    pub fn new(show_colors: bool) -> Self {
        ViewAdapter {
            content: ViewContentCache::default(),
            regions: ViewRegionCache::default(),
            last_cursor: None,
            show_colors,
        }
    }

    /// Terminal dimensions that fit the view, as `(rows, columns)`.
    /// `(0, 0)` when the view has no usable metrics yet.
    pub fn view_size(view: &dyn TerminalHostView) -> (usize, usize) {
        let (width, height) = view.viewport_extent();
        let line_height = view.line_height();
        let em_width = view.em_width();

        if line_height <= 0.0 || em_width <= 0.0 {
            return (0, 0);
        }

        let columns = ((width / em_width) as usize)
            .saturating_sub(RIGHT_MARGIN_COLUMNS)
            .max(1);
        let rows = ((height / line_height) as usize)
            .saturating_sub(BOTTOM_MARGIN_ROWS)
            .max(1);

        (rows, columns)
    }

    /// Apply one frame: changed dirty rows are replaced (or erased, for
    /// rows past a shrunk screen), their color regions are rebuilt, and
    /// the cursor is placed last. Everything happens inside a single
    /// read-only-off span.
    pub fn flush(&mut self, view: &mut dyn TerminalHostView, emulator: &mut TerminalEmulator) {
        let dirty_lines = emulator.dirty_lines();

        if !dirty_lines.is_empty() {
            let color_map = if self.show_colors {
                emulator.color_map(dirty_lines.keys().copied())
            } else {
                HashMap::new()
            };

            view.set_read_only(false);
            for (&line_no, content) in &dirty_lines {
                for key in self.regions.take_line(line_no) {
                    view.erase_color_region(&key);
                }

                match content {
                    None => self.delete_line(view, line_no),
                    Some(content) => {
                        self.update_line_content(view, line_no, content);
                        if let Some(runs) = color_map.get(&line_no) {
                            let (line_start, _) = self.content.line_span(line_no);
                            for (&column, run) in runs {
                                if run.field_length < 1 {
                                    continue;
                                }
                                let key = format!("{line_no},{column}");
                                let scope = format!("quillterm.{}_{}", run.color.0.name(), run.color.1.name());
                                let start = line_start + column;
                                view.add_color_region(&key, start, start + run.field_length, &scope);
                                self.regions.add(line_no, key);
                            }
                        }
                    }
                }
            }
            view.set_read_only(true);
            emulator.clear_dirty();
        }

        self.update_cursor(view, emulator);
    }

    fn update_line_content(&mut self, view: &mut dyn TerminalHostView, line_no: usize, content: &str) {
        let content_with_newline = format!("{content}\n");

        // The cache tells us the host already shows this exact text.
        if self.content.get_line(line_no) == Some(&content_with_newline) {
            return;
        }

        let (start, end) = self.content.line_span(line_no);
        view.replace_region(start, end, &content_with_newline);
        self.content.update_line(line_no, content_with_newline);
    }

    fn delete_line(&mut self, view: &mut dyn TerminalHostView, line_no: usize) {
        if self.content.has_line(line_no) {
            let (start, end) = self.content.line_span(line_no);
            view.erase_region(start, end);
            self.content.delete_line(line_no);
        }
    }

    fn update_cursor(&mut self, view: &mut dyn TerminalHostView, emulator: &TerminalEmulator) {
        if emulator.cursor_is_hidden() {
            view.clear_cursor();
            self.last_cursor = None;
            return;
        }

        let (y, x) = emulator.cursor();
        let (line_start, _) = self.content.line_span(y);
        let point = line_start + x;
        if self.last_cursor != Some(point) {
            view.set_cursor(point);
            self.last_cursor = Some(point);
        }
    }

    /// Text of the selected rows, or of the cursor row when there is no
    /// selection; trailing whitespace is trimmed per row.
    pub fn copy_text(&self, emulator: &TerminalEmulator, selection: Option<(usize, usize)>) -> String {
        let (start, end) = match selection {
            Some((start, end)) => (start, end.min(emulator.lines())),
            None => {
                let (y, _) = emulator.cursor();
                (y, y + 1)
            }
        };

        let display = emulator.display();
        display[start.min(display.len())..end.min(display.len())]
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
