use super::column_data::ColumnData;
use super::validity::Validity;

/// Mapping of logical rows to physical rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatSelection {
    /// Logical row `i` is physical row `i`.
    Linear { len: usize },
    /// Every logical row is physical row 0.
    Constant { len: usize },
}

impl FlatSelection {
    pub const fn len(&self) -> usize {
        match self {
            Self::Linear { len } | Self::Constant { len } => *len,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the physical index for a logical index.
    ///
    /// Returns None if the logical index is out of bounds.
    #[inline]
    pub const fn get(&self, idx: usize) -> Option<usize> {
        match self {
            Self::Linear { len } if idx < *len => Some(idx),
            Self::Constant { len } if idx < *len => Some(0),
            _ => None,
        }
    }
}

/// A view over a column that lets readers ignore how the column is
/// represented.
///
/// Validity and data are always indexed with physical indices.
#[derive(Debug, Clone, Copy)]
pub struct FlatView<'a> {
    pub validity: &'a Validity,
    pub data: &'a ColumnData,
    pub selection: FlatSelection,
}

impl FlatView<'_> {
    /// Get the physical index for a logical index.
    ///
    /// Panics if out of bounds.
    #[inline]
    pub fn physical_index(&self, idx: usize) -> usize {
        match self.selection {
            FlatSelection::Linear { .. } => idx,
            FlatSelection::Constant { .. } => 0,
        }
    }

    /// Check if the logical row at `idx` is valid.
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity.is_valid(self.physical_index(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_selection() {
        let sel = FlatSelection::Constant { len: 3 };
        assert_eq!(Some(0), sel.get(2));
        assert_eq!(None, sel.get(3));
    }

    #[test]
    fn linear_selection() {
        let sel = FlatSelection::Linear { len: 3 };
        assert_eq!(Some(2), sel.get(2));
        assert_eq!(None, sel.get(3));
    }
}
