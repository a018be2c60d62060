use lazy_static::lazy_static;

use crate::Cell;

lazy_static! {
    static ref DEFAULT_CELL: Cell = Cell::default();
}

/// One screen row. Cells are stored only up to the rightmost written
/// column; positions past `cells.len()` read as the default blank cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub cells: Vec<Cell>,
}

impl Line {
    pub fn new() -> Self {
        Line::with_capacity(80)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Line {
            cells: Vec::with_capacity(capacity),
        }
    }

    pub fn cell_at(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&DEFAULT_CELL)
    }

    pub fn set(&mut self, index: usize, cell: Cell) {
        if index >= self.cells.len() {
            self.cells.resize(index + 1, Cell::default());
        }
        self.cells[index] = cell;
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Pad with blanks or truncate so the row holds exactly `width` cells.
    pub fn adjust_width(&mut self, width: usize) {
        self.cells.resize(width, Cell::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_grows_on_demand() {
        let mut line = Line::new();
        line.set(100, Cell::default());
        assert_eq!(101, line.cells.len());
        line.set(100, Cell::default());
        assert_eq!(101, line.cells.len());
    }

    #[test]
    fn cell_at_reads_blanks_past_the_end() {
        let line = Line::new();
        assert_eq!(line.cell_at(7).data, " ");
    }

    #[test]
    fn adjust_width_pads_and_truncates() {
        let mut line = Line::new();
        line.set(4, Cell::default());
        line.adjust_width(3);
        assert_eq!(line.cells.len(), 3);
        line.adjust_width(8);
        assert_eq!(line.cells.len(), 8);
    }
}
