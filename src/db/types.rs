//! Raw row types handed from executors to the decoder.
//!
//! Executors never hand over typed values: every non-NULL cell arrives as
//! the driver's textual rendering and any coercion happens later.

/// A single cell as supplied by the database driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RawCell {
    /// SQL NULL.
    #[default]
    Null,

    /// Textual representation of a non-NULL value.
    Present(String),
}

impl RawCell {
    /// Returns true if this cell is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the cell text, or `None` for NULL.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Present(text) => Some(text),
        }
    }

    /// Overwrites the cell with `text`, reusing the existing allocation.
    pub fn set_text(&mut self, text: &str) {
        match self {
            Self::Present(buf) => {
                buf.clear();
                buf.push_str(text);
            }
            Self::Null => *self = Self::Present(text.to_string()),
        }
    }

    /// Marks the cell as NULL.
    pub fn set_null(&mut self) {
        *self = Self::Null;
    }
}

impl From<Option<&str>> for RawCell {
    fn from(v: Option<&str>) -> Self {
        match v {
            Some(text) => Self::Present(text.to_string()),
            None => Self::Null,
        }
    }
}

impl From<&str> for RawCell {
    fn from(v: &str) -> Self {
        Self::Present(v.to_string())
    }
}

/// Scratch storage for one row, reused across all rows of a query.
///
/// Owned by the decode loop of a single query and refilled in place by the
/// cursor, so steady-state row fetching does not allocate per cell.
#[derive(Debug, Default)]
pub struct RowBuffer {
    cells: Vec<RawCell>,
}

impl RowBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer sized for `width` columns.
    pub fn with_width(width: usize) -> Self {
        Self {
            cells: vec![RawCell::Null; width],
        }
    }

    /// Resizes the buffer to `width` cells, keeping existing allocations.
    pub fn reset(&mut self, width: usize) {
        self.cells.resize(width, RawCell::Null);
    }

    /// Stores one cell value.
    ///
    /// Positions past the current width are ignored; call [`reset`] first.
    ///
    /// [`reset`]: RowBuffer::reset
    pub fn set(&mut self, index: usize, value: Option<&str>) {
        if let Some(cell) = self.cells.get_mut(index) {
            match value {
                Some(text) => cell.set_text(text),
                None => cell.set_null(),
            }
        }
    }

    /// Replaces the whole row with `values`.
    pub fn fill<'v, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = Option<&'v str>>,
    {
        let mut width = 0;
        for value in values {
            if width == self.cells.len() {
                self.cells.push(RawCell::Null);
            }
            self.set(width, value);
            width += 1;
        }
        self.cells.truncate(width);
    }

    /// The cells of the current row.
    pub fn cells(&self) -> &[RawCell] {
        &self.cells
    }

    /// Number of cells in the current row.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the buffer holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
