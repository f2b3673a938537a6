//! Logical output of a build: named grids of typed cells.
//!
//! Nothing here knows about file formats; `output` turns a
//! [`ReportDocument`] into bytes.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(u64),
    /// A fraction in `0.0..=1.0`, displayed as a percentage.
    Percent(f64),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Cell::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_percent(&self) -> Option<f64> {
        match self {
            Cell::Percent(p) => Some(*p),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<u64> for Cell {
    fn from(n: u64) -> Self {
        Cell::Integer(n)
    }
}

/// A horizontal span of cells on one row displayed as a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub row: u32,
    pub first_col: u16,
    pub last_col: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportWorksheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    merges: Vec<Merge>,
}

impl ReportWorksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            merges: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn write(&mut self, row: u32, col: u16, value: impl Into<Cell>) {
        self.cells.insert((row, col), value.into());
    }

    pub fn write_percent(&mut self, row: u32, col: u16, value: f64) {
        self.cells.insert((row, col), Cell::Percent(value));
    }

    /// Write `value` at `(row, first_col)` and span it to `last_col`.
    pub fn merge(&mut self, row: u32, first_col: u16, last_col: u16, value: impl Into<Cell>) {
        self.write(row, first_col, value);
        self.merges.push(Merge {
            row,
            first_col,
            last_col,
        });
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.cells.iter().map(|(&(r, c), cell)| (r, c, cell))
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn is_merged_origin(&self, row: u32, col: u16) -> bool {
        self.merges
            .iter()
            .any(|m| m.row == row && m.first_col == col)
    }
}

/// The ordered set of worksheets a build produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDocument {
    pub worksheets: Vec<ReportWorksheet>,
}

impl ReportDocument {
    pub fn worksheet(&self, name: &str) -> Option<&ReportWorksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.worksheets.iter().map(|ws| ws.name()).collect()
    }
}
