/// Number of glyph columns that fit in `width` pixels (integer floor).
///
/// `font_size_px` must be non-zero; callers validate it through `RainParams::validate`.
pub fn column_count(width: u32, font_size_px: u32) -> usize {
    (width / font_size_px) as usize
}

/// Per-column fall positions, in rows.
///
/// The length always matches the column count of the current viewport; a resize replaces the
/// whole sequence with zeros.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnState {
    drops: Vec<u32>,
}

impl ColumnState {
    /// `columns` drops, all at the top row.
    pub fn new(columns: usize) -> Self {
        Self {
            drops: vec![0; columns],
        }
    }

    /// Discard every position and restart `columns` drops at the top row.
    pub fn reset(&mut self, columns: usize) {
        self.drops.clear();
        self.drops.resize(columns, 0);
    }

    pub fn len(&self) -> usize {
        self.drops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }

    pub fn positions(&self) -> &[u32] {
        &self.drops
    }

    pub(crate) fn positions_mut(&mut self) -> &mut [u32] {
        &mut self.drops
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rain/columns.rs"]
mod tests;
