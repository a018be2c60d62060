use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use quill_parser_core::EraseInDisplayMode;

use crate::{modes, Line, Screen};

/// Scrollback state: two bounded queues of rows that have left the
/// scrolling region (off the top on `index`, off the bottom on
/// `reverse_index`), the page-scroll ratio and the virtual position.
/// `position == size` means the live screen is visible; lower values mean
/// the view is scrolled up into history.
pub struct History {
    pub top: VecDeque<Line>,
    pub bottom: VecDeque<Line>,
    pub ratio: f32,
    pub size: usize,
    pub position: usize,
}

impl History {
    fn new(size: usize, ratio: f32) -> Self {
        History {
            top: VecDeque::new(),
            bottom: VecDeque::new(),
            ratio,
            size,
            position: size,
        }
    }

    // The top queue holds half the budget; the two queues share it.
    fn top_capacity(&self) -> usize {
        self.size / 2
    }

    fn bottom_capacity(&self) -> usize {
        self.size
    }
}

fn push_back_capped(queue: &mut VecDeque<Line>, line: Line, capacity: usize) {
    queue.push_back(line);
    while queue.len() > capacity {
        queue.pop_front();
    }
}

fn push_front_capped(queue: &mut VecDeque<Line>, line: Line, capacity: usize) {
    queue.push_front(line);
    while queue.len() > capacity {
        queue.pop_back();
    }
}

/// A [`Screen`] that records scrolled-off rows and supports paging
/// through them. All non-pagination traffic must first return the view to
/// the live screen (see [`HistoryScreen::scroll_to_bottom`]); the
/// emulator facade takes care of that.
pub struct HistoryScreen {
    screen: Screen,
    pub history: History,
}

impl Deref for HistoryScreen {
    type Target = Screen;

    fn deref(&self) -> &Screen {
        &self.screen
    }
}

impl DerefMut for HistoryScreen {
    fn deref_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }
}

impl HistoryScreen {
    pub fn new(columns: usize, lines: usize, history: usize, ratio: f32) -> Self {
        let mut screen = Screen::new(columns, lines);
        screen.record_scrolled = true;
        HistoryScreen {
            screen,
            history: History::new(history, ratio),
        }
    }

    fn reset_history(&mut self) {
        self.history.top.clear();
        self.history.bottom.clear();
        self.history.position = self.history.size;
    }

    /// Move rows the screen staged while scrolling into the bounded
    /// history queues. Must run after every operation that can scroll,
    /// including draws that auto-wrap off the bottom margin.
    fn collect_scrolled(&mut self) {
        let top_capacity = self.history.top_capacity();
        for line in self.screen.scrolled_off_top.drain(..) {
            push_back_capped(&mut self.history.top, line, top_capacity);
        }

        let bottom_capacity = self.history.bottom_capacity();
        for line in self.screen.scrolled_off_bottom.drain(..) {
            push_back_capped(&mut self.history.bottom, line, bottom_capacity);
        }
    }

    /// Reset the terminal and drop all scrollback.
    pub fn reset(&mut self) {
        self.screen.reset();
        self.reset_history();
    }

    /// Erase in display; mode 3 also drops the scrollback.
    pub fn erase_in_display(&mut self, how: EraseInDisplayMode) {
        self.screen.erase_in_display(how);
        if how == EraseInDisplayMode::AllAndScrollback {
            self.reset_history();
        }
    }

    /// Display text; rows pushed off the top by auto-wrap land in the
    /// history.
    pub fn draw(&mut self, data: &str) {
        self.screen.draw(data);
        self.collect_scrolled();
    }

    /// Index, remembering the row that leaves the top of the scrolling
    /// region.
    pub fn index(&mut self) {
        self.screen.index();
        self.collect_scrolled();
    }

    /// Reverse index, remembering the row that leaves the bottom of the
    /// scrolling region.
    pub fn reverse_index(&mut self) {
        self.screen.reverse_index();
        self.collect_scrolled();
    }

    pub fn linefeed(&mut self) {
        self.screen.linefeed();
        self.collect_scrolled();
    }

    /// Page size for a scroll step: a `ratio` fraction of the screen,
    /// bounded by what the queue actually holds and by the screen height.
    fn page_delta(&self, available: usize) -> usize {
        let step = (self.screen.lines() as f32 * self.history.ratio).ceil() as usize;
        available.min(step).min(self.screen.lines())
    }

    /// Move the view one page up through the history.
    pub fn prev_page(&mut self) {
        if self.history.position > self.screen.lines() && !self.history.top.is_empty() {
            let mid = self.page_delta(self.history.top.len());
            self.scroll_up_by(mid, self.screen.lines());
        }
    }

    /// Move the view one row up through the history.
    pub fn prev_line(&mut self) {
        if self.history.position > self.screen.lines() && !self.history.top.is_empty() {
            self.scroll_up_by(1, 1);
        }
    }

    /// Move the view one page down towards the live screen.
    pub fn next_page(&mut self) {
        if self.history.position < self.history.size && !self.history.bottom.is_empty() {
            let mid = self.page_delta(self.history.bottom.len());
            self.scroll_down_by(mid, self.screen.lines());
        }
    }

    /// Move the view one row down towards the live screen.
    pub fn next_line(&mut self) {
        if self.history.position < self.history.size && !self.history.bottom.is_empty() {
            self.scroll_down_by(1, 1);
        }
    }

    fn scroll_up_by(&mut self, mid: usize, position_delta: usize) {
        let lines = self.screen.lines();

        // The bottom `mid` rows of the visible buffer move to the front
        // of the bottom queue, preserving their order.
        let capacity = self.history.bottom_capacity();
        for y in ((lines - mid)..lines).rev() {
            let line = self.screen.buffer[y].clone();
            push_front_capped(&mut self.history.bottom, line, capacity);
        }
        self.history.position -= position_delta;

        // Shift the remaining rows down and fill the vacated rows from
        // the top queue.
        self.screen.buffer.rotate_right(mid);
        for y in (0..mid).rev() {
            if let Some(line) = self.history.top.pop_back() {
                self.screen.buffer[y] = line;
            }
        }

        self.screen.dirty = (0..lines).collect();
    }

    fn scroll_down_by(&mut self, mid: usize, position_delta: usize) {
        let lines = self.screen.lines();

        let capacity = self.history.top_capacity();
        for y in 0..mid {
            let line = self.screen.buffer[y].clone();
            push_back_capped(&mut self.history.top, line, capacity);
        }
        self.history.position += position_delta;

        self.screen.buffer.rotate_left(mid);
        for y in (lines - mid)..lines {
            if let Some(line) = self.history.bottom.pop_front() {
                self.screen.buffer[y] = line;
            }
        }

        self.screen.dirty = (0..lines).collect();
    }

    /// Return the view to the live screen. Paging past the live screen is
    /// a no-op, so this is idempotent.
    pub fn scroll_to_bottom(&mut self) {
        while self.history.position < self.history.size && !self.history.bottom.is_empty() {
            self.next_page();
        }
    }

    /// After pagination every visible row must hold exactly `columns`
    /// cells; rows coming out of history may be narrower or wider. Also
    /// recomputes cursor visibility: the cursor shows only near the live
    /// screen and only with DECTCEM set.
    pub fn ensure_screen_width(&mut self) {
        let columns = self.screen.columns();
        for line in &mut self.screen.buffer {
            line.adjust_width(columns);
        }

        let near_live = self.history.size.abs_diff(self.history.position) < self.screen.lines();
        self.screen.cursor.hidden = !(near_live && self.screen.has_mode(modes::DECTCEM));
    }
}
