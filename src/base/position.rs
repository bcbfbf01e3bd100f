//! Position tracking for nodes and diagnostics
//!
//! Rows and columns are zero-based. Columns count bytes, so a point can be
//! turned back into an offset without decoding the line.

use text_size::TextSize;

/// A row/column position in source text (both 0-indexed, column in bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// Line start table for converting byte offsets into [`Point`]s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &[u8]) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.iter()
                .enumerate()
                .filter(|(_, b)| **b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Offsets past the end clamp to the end of the text.
    pub fn point(&self, offset: usize) -> Point {
        let offset = offset.min(self.len);
        let row = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Point::new(row, offset - self.line_starts[row])
    }

    pub fn line_col(&self, offset: TextSize) -> Point {
        self.point(u32::from(offset) as usize)
    }

    /// Inverse of [`point`](Self::point); columns past the line end clamp
    /// to the end of the text.
    pub fn offset(&self, point: Point) -> Option<usize> {
        let start = *self.line_starts.get(point.row)?;
        Some((start + point.column).min(self.len))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
