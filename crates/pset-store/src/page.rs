use std::collections::BTreeMap;
use std::ops::RangeBounds;

/// A sparse set of values sharing one page of the index space.
///
/// Slots are addressed by their in-page offset. Only occupied slots take
/// memory; `len()` reports how many there are.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyPage<V> {
    slots: BTreeMap<u32, V>,
}

impl<V> PropertyPage<V> {
    /// Create an empty page.
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Store `value` at `offset`, returning whatever was there before.
    pub fn put(&mut self, offset: u32, value: V) -> Option<V> {
        self.slots.insert(offset, value)
    }

    /// The value at `offset`, if any.
    pub fn get(&self, offset: u32) -> Option<&V> {
        self.slots.get(&offset)
    }

    /// Remove and return the value at `offset`.
    pub fn remove(&mut self, offset: u32) -> Option<V> {
        self.slots.remove(&offset)
    }

    /// Returns `true` if `offset` is occupied.
    pub fn contains(&self, offset: u32) -> bool {
        self.slots.contains_key(&offset)
    }

    pub fn first_offset(&self) -> Option<u32> {
        self.slots.keys().next().copied()
    }

    pub fn last_offset(&self) -> Option<u32> {
        self.slots.keys().next_back().copied()
    }

    /// Smallest occupied offset strictly greater than `after`.
    pub fn next_offset(&self, after: u32) -> Option<u32> {
        let start = after.checked_add(1)?;
        self.slots.range(start..).next().map(|(k, _)| *k)
    }

    /// Largest occupied offset strictly less than `before`.
    pub fn previous_offset(&self, before: u32) -> Option<u32> {
        self.slots.range(..before).next_back().map(|(k, _)| *k)
    }

    /// Occupied slots in offset order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (u32, &V)> + '_ {
        self.slots.iter().map(|(k, v)| (*k, v))
    }

    /// Occupied slots whose offsets fall in `range`, in offset order.
    pub fn range<R>(&self, range: R) -> impl DoubleEndedIterator<Item = (u32, &V)> + '_
    where
        R: RangeBounds<u32>,
    {
        self.slots.range(range).map(|(k, v)| (*k, v))
    }
}

impl<V> IntoIterator for PropertyPage<V> {
    type Item = (u32, V);
    type IntoIter = std::collections::btree_map::IntoIter<u32, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}

impl<V> Default for PropertyPage<V> {
    fn default() -> Self {
        Self::new()
    }
}
