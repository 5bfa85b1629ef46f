//! Batch window selection
//!
//! A run processes the contiguous slice `items[start_offset..min(start_offset + count, total)]`
//! of the input list. The window is supplied by the operator; there is no resume bookkeeping.

/// Result of selecting a batch from the full list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection<'a, T> {
    /// The non-empty slice to process, in list order
    Items(&'a [T]),
    /// `start_offset` is at or past the end of the list
    OutOfRange {
        /// Requested first index
        start_offset: usize,
        /// Length of the full list
        total: usize,
    },
    /// The window is valid but selects nothing (e.g. `count == 0`)
    Empty,
}

impl<'a, T> Selection<'a, T> {
    /// The selected items; empty for `OutOfRange` and `Empty`
    pub fn items(&self) -> &'a [T] {
        match self {
            Selection::Items(items) => *items,
            Selection::OutOfRange { .. } | Selection::Empty => &[],
        }
    }

    /// Number of selected items
    pub fn len(&self) -> usize {
        self.items().len()
    }

    /// Whether nothing was selected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Select the batch window `[start_offset, start_offset + count)` clipped to `items`
///
/// `count = None` selects through the end of the list.
pub fn select_batch<T>(items: &[T], start_offset: usize, count: Option<usize>) -> Selection<'_, T> {
    let total = items.len();
    if start_offset >= total {
        return Selection::OutOfRange {
            start_offset,
            total,
        };
    }

    let end = match count {
        Some(count) => start_offset.saturating_add(count).min(total),
        None => total,
    };

    if end <= start_offset {
        return Selection::Empty;
    }
    Selection::Items(&items[start_offset..end])
}
