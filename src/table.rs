use serde::{Deserialize, Serialize};

/// Raw rows-of-cells as the external store returns them: first row is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Splits a raw grid into header + body. An empty grid is an empty table.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let header = rows.remove(0);
        Self { header, rows }
    }

    /// Flattens back into a grid with the header first.
    pub fn into_rows(self) -> Vec<Vec<String>> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.header);
        grid.extend(self.rows);
        grid
    }

    pub fn is_empty(&self) -> bool {
        self.header.iter().all(|h| h.trim().is_empty()) && self.rows.is_empty()
    }

    /// Cell at (row, column); ragged rows read as empty cells.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}
