//! Compact sets of element indices.
//!
//! An [`IndexSet`] is either a contiguous range (bounds only) or an explicit
//! list of indices. Ranges are materialized only when a caller asks for the
//! explicit sequence.

use std::borrow::Cow;
use std::ops::Range;

/// A set of non-negative element indices backed by a range or an index list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSet<'a> {
    repr: Repr<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Repr<'a> {
    Range(Range<usize>),
    Indices(Cow<'a, [usize]>),
}

impl Default for IndexSet<'_> {
    fn default() -> Self {
        Self::from_range(0..0)
    }
}

impl<'a> IndexSet<'a> {
    /// Creates a set covering a contiguous range without allocating.
    #[must_use]
    pub fn from_range(range: Range<usize>) -> Self {
        Self {
            repr: Repr::Range(range),
        }
    }

    /// Creates a set that borrows an explicit index list, in any order.
    #[must_use]
    pub fn from_indices(indices: &'a [usize]) -> Self {
        Self {
            repr: Repr::Indices(Cow::Borrowed(indices)),
        }
    }

    /// Creates a set that owns an explicit index list, sorted ascending.
    #[must_use]
    pub fn from_vec(mut indices: Vec<usize>) -> IndexSet<'static> {
        indices.sort_unstable();
        IndexSet {
            repr: Repr::Indices(Cow::Owned(indices)),
        }
    }

    /// Number of indices in the set.
    #[must_use]
    pub fn size(&self) -> usize {
        match &self.repr {
            Repr::Range(r) => r.len(),
            Repr::Indices(indices) => indices.len(),
        }
    }

    /// Returns `true` if the set holds no indices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns `true` if the set is stored as a range.
    #[must_use]
    pub fn is_range(&self) -> bool {
        matches!(self.repr, Repr::Range(_))
    }

    /// Returns the underlying range when the set is range-backed.
    #[must_use]
    pub fn as_range(&self) -> Option<Range<usize>> {
        match &self.repr {
            Repr::Range(r) => Some(r.clone()),
            Repr::Indices(_) => None,
        }
    }

    /// Smallest array length that every index in the set can address.
    #[must_use]
    pub fn min_array_size(&self) -> usize {
        let max = match &self.repr {
            Repr::Range(_) => self.last(),
            Repr::Indices(indices) => indices.iter().max().copied(),
        };
        max.map_or(0, |max| max + 1)
    }

    /// The final index in the set.
    #[must_use]
    pub fn last(&self) -> Option<usize> {
        match &self.repr {
            Repr::Range(r) if r.is_empty() => None,
            Repr::Range(r) => Some(r.end - 1),
            Repr::Indices(indices) => indices.last().copied(),
        }
    }

    /// Returns the index stored at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<usize> {
        match &self.repr {
            Repr::Range(r) => (position < r.len()).then(|| r.start + position),
            Repr::Indices(indices) => indices.get(position).copied(),
        }
    }

    /// The explicit index sequence, materializing a range only on demand.
    #[must_use]
    pub fn indices(&self) -> Cow<'_, [usize]> {
        match &self.repr {
            Repr::Range(r) => Cow::Owned(r.clone().collect()),
            Repr::Indices(indices) => Cow::Borrowed(indices),
        }
    }

    /// Iterates the indices in order without materializing a range.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        let (range, list) = match &self.repr {
            Repr::Range(r) => (Some(r.clone()), None),
            Repr::Indices(indices) => (None, Some(indices.iter().copied())),
        };
        range.into_iter().flatten().chain(list.into_iter().flatten())
    }

    /// Slices the positions in `range` and subtracts the smallest sliced
    /// index from every value.
    ///
    /// Contiguous results come back range-backed and leave `scratch` alone.
    /// Otherwise the re-based indices are written into `scratch`, which the
    /// returned set borrows.
    ///
    /// # Panics
    ///
    /// Panics if `range` extends past [`IndexSet::size`].
    #[must_use]
    pub fn slice_and_offset<'s>(
        &self,
        range: Range<usize>,
        scratch: &'s mut Vec<usize>,
    ) -> IndexSet<'s> {
        assert!(
            range.end <= self.size(),
            "slice {range:?} out of bounds for index set of size {}",
            self.size()
        );
        if range.is_empty() {
            return IndexSet::default();
        }
        match &self.repr {
            Repr::Range(_) => IndexSet::from_range(0..range.len()),
            Repr::Indices(indices) => {
                let sliced = &indices[range.clone()];
                let offset = sliced.iter().min().copied().unwrap_or(0);
                if sliced.windows(2).all(|w| w[1] == w[0] + 1) {
                    return IndexSet::from_range(0..sliced.len());
                }
                scratch.clear();
                scratch.extend(sliced.iter().map(|&i| i - offset));
                IndexSet::from_indices(scratch)
            }
        }
    }
}

impl From<Range<usize>> for IndexSet<'_> {
    fn from(range: Range<usize>) -> Self {
        Self::from_range(range)
    }
}

impl<'a> From<&'a [usize]> for IndexSet<'a> {
    fn from(indices: &'a [usize]) -> Self {
        Self::from_indices(indices)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let set = IndexSet::default();
        assert_eq!(set.min_array_size(), 0);
        assert_eq!(set.size(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn array_constructor() {
        let values = [3, 5, 6, 7];
        let set = IndexSet::from_indices(&values);
        assert_eq!(set.size(), 4);
        assert_eq!(set.min_array_size(), 8);
        assert!(!set.is_range());
        assert_eq!(set.get(0), Some(3));
        assert_eq!(set.get(1), Some(5));
        assert_eq!(set.get(2), Some(6));
        assert_eq!(set.get(3), Some(7));
        assert_eq!(set.get(4), None);
    }

    #[test]
    fn range_constructor() {
        let set = IndexSet::from_range(3..8);
        assert_eq!(set.size(), 5);
        assert_eq!(set.min_array_size(), 8);
        assert_eq!(set.last(), Some(7));
        assert!(set.is_range());
        assert_eq!(set.as_range(), Some(3..8));
        let indices = set.indices();
        assert_eq!(&indices[..3], &[3, 4, 5]);
    }

    #[test]
    fn iter_matches_indices() {
        let set = IndexSet::from_range(2..5);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
        let owned = IndexSet::from_vec(vec![1, 9]);
        assert_eq!(owned.iter().collect::<Vec<_>>(), vec![1, 9]);
    }

    #[test]
    fn unsorted_list_sizes_by_largest_index() {
        let values = [9, 2];
        assert_eq!(IndexSet::from_indices(&values).min_array_size(), 10);
        let owned = IndexSet::from_vec(vec![8, 0, 3]);
        assert_eq!(owned.iter().collect::<Vec<_>>(), vec![0, 3, 8]);
        assert_eq!(owned.min_array_size(), 9);
    }

    // ── slice_and_offset ───────────────────────────────────────

    #[test]
    fn slicing_a_range_stays_a_range() {
        let mut scratch = Vec::new();
        let set = IndexSet::from_range(0..10);
        let sliced = set.slice_and_offset(3..8, &mut scratch);
        assert!(sliced.is_range());
        assert_eq!(sliced.size(), 5);
        assert_eq!(sliced.get(0), Some(0));
        assert_eq!(sliced.get(1), Some(1));
        assert!(scratch.is_empty());
    }

    #[test]
    fn slicing_offset_range_rebases_to_zero() {
        let mut scratch = Vec::new();
        let set = IndexSet::from_range(20..30);
        let sliced = set.slice_and_offset(4..6, &mut scratch);
        assert_eq!(sliced.as_range(), Some(0..2));
    }

    #[test]
    fn slicing_sparse_indices_writes_scratch() {
        let mut scratch = Vec::new();
        let original = [2, 3, 5, 7, 8, 9, 10];
        let set = IndexSet::from_indices(&original);
        let sliced = set.slice_and_offset(1..5, &mut scratch);
        assert!(!sliced.is_range());
        assert_eq!(sliced.size(), 4);
        assert_eq!(sliced.get(0), Some(0));
        assert_eq!(sliced.get(1), Some(2));
        assert_eq!(sliced.get(2), Some(4));
        assert_eq!(sliced.get(3), Some(5));
    }

    #[test]
    fn slicing_contiguous_indices_returns_range() {
        let mut scratch = Vec::new();
        let original = [2, 3, 5, 7, 8, 9, 10];
        let set = IndexSet::from_indices(&original);
        let sliced = set.slice_and_offset(3..7, &mut scratch);
        assert!(sliced.is_range());
        assert_eq!(sliced.as_range(), Some(0..4));
        assert!(scratch.is_empty());
    }

    #[test]
    fn sliced_values_equal_offset_source() {
        let mut scratch = Vec::new();
        let original = [1, 4, 6, 11, 12, 20];
        let set = IndexSet::from_indices(&original);
        let sliced = set.slice_and_offset(2..6, &mut scratch);
        for i in 0..sliced.size() {
            assert_eq!(sliced.get(i).unwrap(), original[2 + i] - original[2]);
        }
    }

    #[test]
    fn unsorted_slice_rebases_by_smallest() {
        let mut scratch = Vec::new();
        let original = [5, 3, 8];
        let set = IndexSet::from_indices(&original);
        let sliced = set.slice_and_offset(0..2, &mut scratch);
        assert_eq!(sliced.iter().collect::<Vec<_>>(), vec![2, 0]);
        assert_eq!(sliced.min_array_size(), 3);
    }

    #[test]
    fn empty_slice_is_default() {
        let mut scratch = Vec::new();
        let set = IndexSet::from_range(0..4);
        assert!(set.slice_and_offset(2..2, &mut scratch).is_empty());
    }
}
