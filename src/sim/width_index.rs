//! WidthIndex - O(log n) slot offsets via Fenwick tree
//!
//! Slots in a horizontal strip sit side by side, so a slot's left offset is
//! the sum of the widths before it. Widths change constantly as items cloak
//! and uncloak; the Fenwick tree keeps both updates and offset queries
//! logarithmic.
//!
//! # Complexity
//!
//! - `set`: O(log n)
//! - `offset` / `prefix_sum`: O(log n)
//! - `push`: O(log n)
//! - `rebuild`: O(n log n)

/// Fenwick-tree backed prefix sums over slot widths.
#[derive(Debug, Clone, Default)]
pub struct WidthIndex {
    /// Fenwick tree backing storage (1-indexed internally, 0-indexed API)
    tree: Vec<isize>,
    /// Plain widths, for O(1) reads and rebuilds.
    widths: Vec<usize>,
}

impl WidthIndex {
    /// Creates an empty index with pre-allocated capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cloakline::sim::width_index::WidthIndex;
    /// let index = WidthIndex::new(16);
    /// assert!(index.is_empty());
    /// assert_eq!(index.total(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity],
            widths: Vec::with_capacity(capacity),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    /// Returns true if the index has no slots.
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Width of the slot at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn width(&self, index: usize) -> usize {
        self.widths[index]
    }

    /// Sets the width at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cloakline::sim::width_index::WidthIndex;
    /// let mut index = WidthIndex::new(4);
    /// index.push(100);
    /// index.push(100);
    /// index.set(0, 40);
    /// assert_eq!(index.offset(1), 40);
    /// ```
    pub fn set(&mut self, index: usize, width: usize) {
        assert!(
            index < self.len(),
            "index {} out of bounds (len: {})",
            index,
            self.len()
        );

        let delta = width as isize - self.widths[index] as isize;
        if delta != 0 {
            fenwick::array::update(&mut self.tree, index, delta);
            self.widths[index] = width;
        }
    }

    /// Cumulative width up to and including `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn prefix_sum(&self, index: usize) -> usize {
        assert!(
            index < self.len(),
            "index {} out of bounds (len: {})",
            index,
            self.len()
        );

        fenwick::array::prefix_sum(&self.tree, index).max(0) as usize
    }

    /// Left offset of the slot at `index` (sum of the widths before it).
    ///
    /// `offset(len())` is the total width.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cloakline::sim::width_index::WidthIndex;
    /// let mut index = WidthIndex::new(4);
    /// index.push(30);
    /// index.push(50);
    /// assert_eq!(index.offset(0), 0);
    /// assert_eq!(index.offset(1), 30);
    /// assert_eq!(index.offset(2), 80);
    /// ```
    pub fn offset(&self, index: usize) -> usize {
        if index == 0 {
            0
        } else {
            self.prefix_sum(index - 1)
        }
    }

    /// Total width of all slots.
    pub fn total(&self) -> usize {
        self.offset(self.len())
    }

    /// Appends a slot, growing the backing storage if necessary.
    ///
    /// Growing re-derives every tree node: nodes past the old capacity cover
    /// ranges that include existing slots.
    pub fn push(&mut self, width: usize) {
        self.widths.push(width);

        if self.widths.len() > self.tree.len() {
            let capacity = (self.tree.len().max(1) * 2).max(self.widths.len());
            self.tree = vec![0; capacity];
            for (i, &w) in self.widths.iter().enumerate() {
                fenwick::array::update(&mut self.tree, i, w as isize);
            }
        } else {
            fenwick::array::update(&mut self.tree, self.widths.len() - 1, width as isize);
        }
    }

    /// Replace every slot width, e.g. after slots were inserted or removed
    /// in the middle.
    pub fn rebuild(&mut self, widths: impl IntoIterator<Item = usize>) {
        self.clear();
        for width in widths {
            self.push(width);
        }
    }

    /// Clears all slots, retaining allocated capacity.
    pub fn clear(&mut self) {
        for slot in self.tree.iter_mut() {
            *slot = 0;
        }
        self.widths.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_index() {
        let index = WidthIndex::new(8);
        assert_eq!(index.len(), 0);
        assert_eq!(index.total(), 0);
        assert_eq!(index.offset(0), 0);
    }

    #[test]
    fn offsets_are_exclusive_prefix_sums() {
        let mut index = WidthIndex::new(2);
        for w in [100, 100, 250, 0, 10] {
            index.push(w);
        }

        assert_eq!(index.offset(0), 0);
        assert_eq!(index.offset(1), 100);
        assert_eq!(index.offset(2), 200);
        assert_eq!(index.offset(3), 450);
        assert_eq!(index.offset(4), 450);
        assert_eq!(index.total(), 460);
    }

    #[test]
    fn set_shifts_every_later_offset() {
        let mut index = WidthIndex::new(4);
        for _ in 0..4 {
            index.push(100);
        }

        index.set(1, 30);

        assert_eq!(index.width(1), 30);
        assert_eq!(index.offset(2), 130);
        assert_eq!(index.offset(3), 230);
        assert_eq!(index.total(), 330);
    }

    #[test]
    fn rebuild_replaces_contents() {
        let mut index = WidthIndex::new(4);
        index.push(7);
        index.push(9);

        index.rebuild([1, 2, 3]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.total(), 6);
        assert_eq!(index.offset(2), 3);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn set_out_of_bounds_panics() {
        let mut index = WidthIndex::new(4);
        index.set(0, 1);
    }

    proptest! {
        /// offset(i) equals the plain sum of widths before i, after arbitrary updates.
        #[test]
        fn prop_offsets_match_naive_sums(
            widths in prop::collection::vec(0usize..=400, 1..60),
            updates in prop::collection::vec((0usize..60, 0usize..=400), 0..20),
        ) {
            let mut index = WidthIndex::new(1);
            let mut naive = widths.clone();
            index.rebuild(widths);

            for (i, w) in updates {
                if i < naive.len() {
                    index.set(i, w);
                    naive[i] = w;
                }
            }

            let mut acc = 0;
            for (i, w) in naive.iter().enumerate() {
                prop_assert_eq!(index.offset(i), acc);
                acc += w;
            }
            prop_assert_eq!(index.total(), acc);
        }
    }
}
