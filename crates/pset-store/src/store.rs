use std::fmt;
use std::ops::Bound;

use pset_types::{PageId, PagePartitioner};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::directory::PageDirectory;
use crate::error::{StoreError, StoreResult};
use crate::traits::{PropertySink, PropertySource};

/// Sparse mapping from 64-bit indices to values, backed by lazily created
/// pages.
///
/// The store keeps a running count of occupied slots. Every mutation adjusts
/// it by the size change it observed on the touched page, so the count always
/// equals the sum of page sizes without ever walking the pages.
///
/// There is no internal locking. Mutation takes `&mut self`; callers sharing
/// a store across threads wrap the whole store in a lock.
#[derive(Clone)]
pub struct ObjectPropertyStore<V> {
    name: String,
    partitioner: PagePartitioner,
    nominal_entry_size: usize,
    pages: PageDirectory<V>,
    live_count: usize,
}

impl<V> ObjectPropertyStore<V> {
    /// Create an empty store with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        let config = StoreConfig::default();
        Self {
            name: name.into(),
            partitioner: PagePartitioner::default(),
            nominal_entry_size: config.nominal_entry_size,
            pages: PageDirectory::new(),
            live_count: 0,
        }
    }

    /// Create an empty store from an explicit configuration.
    pub fn with_config(name: impl Into<String>, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            partitioner: config.partitioner()?,
            nominal_entry_size: config.nominal_entry_size,
            pages: PageDirectory::new(),
            live_count: 0,
        })
    }

    /// The name this store was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Returns `true` if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Number of pages created so far.
    pub fn page_count(&self) -> usize {
        self.pages.page_count()
    }

    /// The partitioner mapping indices to pages.
    pub fn partitioner(&self) -> &PagePartitioner {
        &self.partitioner
    }

    /// Approximate footprint of one entry in bytes.
    ///
    /// This is an estimate for coarse sizing (20 unless configured
    /// otherwise), not the measured size of any stored value.
    pub fn nominal_entry_size(&self) -> usize {
        self.nominal_entry_size
    }

    /// `len() * nominal_entry_size()`. An estimate, like the per-entry figure.
    pub fn estimated_footprint(&self) -> usize {
        self.live_count.saturating_mul(self.nominal_entry_size)
    }

    // -----------------------------------------------------------------------
    // Single-index operations
    // -----------------------------------------------------------------------

    /// Store `value` at `index`, replacing any value already there.
    pub fn put(&mut self, index: u64, value: V) {
        let pos = self.partitioner.resolve(index);
        let page = self.pages.get_or_create(pos.page);
        let before = page.len();
        page.put(pos.offset, value);
        let after = page.len();
        self.reconcile(before, after);
    }

    /// The value stored at `index`, if any. Never creates a page.
    pub fn get(&self, index: u64) -> Option<&V> {
        let pos = self.partitioner.resolve(index);
        self.pages.get(pos.page)?.get(pos.offset)
    }

    /// Returns `true` if a value is stored at `index`.
    pub fn contains(&self, index: u64) -> bool {
        self.get(index).is_some()
    }

    /// Remove and return the value at `index`. Removing an empty index is a
    /// no-op.
    pub fn remove(&mut self, index: u64) -> Option<V> {
        let pos = self.partitioner.resolve(index);
        let page = self.pages.get_mut(pos.page)?;
        let before = page.len();
        let removed = page.remove(pos.offset);
        let after = page.len();
        self.reconcile(before, after);
        removed
    }

    /// Relocate the value at `from` to `to`, replacing anything at `to`.
    ///
    /// `from` must be occupied. If it is not, nothing changes and
    /// `StoreError::EmptySource` is returned.
    pub fn move_index(&mut self, from: u64, to: u64) -> StoreResult<()> {
        let value = self
            .remove(from)
            .ok_or(StoreError::EmptySource { index: from })?;
        self.put(to, value);
        trace!(store = %self.name, from, to, "moved property");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Range operations
    // -----------------------------------------------------------------------

    /// Remove every entry in `[start, end]`. Returns how many were removed.
    pub fn remove_range(&mut self, start: u64, end: u64) -> StoreResult<usize> {
        check_range(start, end)?;
        let indices: Vec<u64> = self.range(start, end).map(|(index, _)| index).collect();
        for &index in &indices {
            self.remove(index);
        }
        debug!(store = %self.name, start, end, removed = indices.len(), "removed range");
        Ok(indices.len())
    }

    /// Move every entry in `[start, end]` to the same relative position in
    /// `[new_start, new_start + (end - start)]`.
    ///
    /// Afterwards the destination range holds exactly the moved entries;
    /// anything previously stored there is dropped. Source and destination
    /// may overlap. Returns the number of entries moved.
    pub fn move_range(&mut self, start: u64, end: u64, new_start: u64) -> StoreResult<usize> {
        check_range(start, end)?;
        let new_end = new_start
            .checked_add(end - start)
            .ok_or(StoreError::IndexOverflow {
                start,
                end,
                new_start,
            })?;

        let indices: Vec<u64> = self.range(start, end).map(|(index, _)| index).collect();
        if new_start == start {
            return Ok(indices.len());
        }

        let moved: Vec<(u64, V)> = indices
            .into_iter()
            .filter_map(|index| self.remove(index).map(|value| (index - start, value)))
            .collect();
        self.remove_range(new_start, new_end)?;
        let count = moved.len();
        for (delta, value) in moved {
            self.put(new_start + delta, value);
        }

        debug!(store = %self.name, start, end, new_start, moved = count, "moved range");
        Ok(count)
    }

    /// Entries with indices in `[start, end]`, in index order.
    ///
    /// A reversed range yields nothing.
    pub fn range(&self, start: u64, end: u64) -> impl Iterator<Item = (u64, &V)> + '_ {
        let p = self.partitioner;
        let bounds = (start <= end).then(|| (p.page_id(start), p.page_id(end)));
        bounds.into_iter().flat_map(move |(first, last)| {
            self.pages
                .range(first..=last)
                .flat_map(move |(id, page)| {
                    let lo = if id == first { p.page_offset(start) } else { 0 };
                    let hi = if id == last { p.page_offset(end) } else { u32::MAX };
                    page.range(lo..=hi)
                        .map(move |(offset, value)| (p.compose(id, offset), value))
                })
        })
    }

    /// Returns `true` if any entry lies in `[start, end]`.
    pub fn intersects(&self, start: u64, end: u64) -> bool {
        self.range(start, end).next().is_some()
    }

    /// All entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &V)> + '_ {
        let p = self.partitioner;
        self.pages.iter().flat_map(move |(id, page)| {
            page.iter()
                .map(move |(offset, value)| (p.compose(id, offset), value))
        })
    }

    /// Consume the store, yielding owned entries in index order.
    pub fn into_entries(self) -> impl Iterator<Item = (u64, V)> {
        let p = self.partitioner;
        self.pages.into_pages().flat_map(move |(id, page)| {
            page.into_iter()
                .map(move |(offset, value)| (p.compose(id, offset), value))
        })
    }

    /// All occupied indices in order.
    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.iter().map(|(index, _)| index)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Lowest occupied index.
    pub fn first_index(&self) -> Option<u64> {
        self.pages
            .iter()
            .find_map(|(id, page)| self.compose_in(id, page.first_offset()))
    }

    /// Highest occupied index.
    pub fn last_index(&self) -> Option<u64> {
        self.pages
            .iter()
            .rev()
            .find_map(|(id, page)| self.compose_in(id, page.last_offset()))
    }

    /// Lowest occupied index strictly greater than `after`.
    pub fn next_index(&self, after: u64) -> Option<u64> {
        let pos = self.partitioner.resolve(after);
        if let Some(page) = self.pages.get(pos.page) {
            if let Some(index) = self.compose_in(pos.page, page.next_offset(pos.offset)) {
                return Some(index);
            }
        }
        self.pages
            .range((Bound::Excluded(pos.page), Bound::Unbounded))
            .find_map(|(id, page)| self.compose_in(id, page.first_offset()))
    }

    /// Highest occupied index strictly less than `before`.
    pub fn previous_index(&self, before: u64) -> Option<u64> {
        let pos = self.partitioner.resolve(before);
        if let Some(page) = self.pages.get(pos.page) {
            if let Some(index) = self.compose_in(pos.page, page.previous_offset(pos.offset)) {
                return Some(index);
            }
        }
        self.pages
            .range(..pos.page)
            .rev()
            .find_map(|(id, page)| self.compose_in(id, page.last_offset()))
    }

    // -----------------------------------------------------------------------
    // Visitation
    // -----------------------------------------------------------------------

    /// Call `visitor` with the value at `index`, if there is one.
    ///
    /// Returns `Ok(true)` if the visitor ran, `Ok(false)` if the index was
    /// empty. Visitor errors are returned unchanged.
    pub fn apply_value<F, E>(&self, index: u64, visitor: F) -> Result<bool, E>
    where
        F: FnOnce(&V) -> Result<(), E>,
    {
        match self.get(index) {
            Some(value) => {
                visitor(value)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Call `visitor` for every entry in `[start, end]`, in index order.
    ///
    /// Stops at the first visitor error. Returns the number of entries
    /// visited.
    pub fn apply_range<F, E>(&self, start: u64, end: u64, mut visitor: F) -> Result<usize, E>
    where
        F: FnMut(u64, &V) -> Result<(), E>,
    {
        let mut visited = 0;
        for (index, value) in self.range(start, end) {
            visitor(index, value)?;
            visited += 1;
        }
        Ok(visited)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Write the value at `index` to `sink`.
    ///
    /// Only the value is written; the caller decides which indices to save
    /// and must restore them in the same order.
    pub fn save_property<S>(&self, index: u64, sink: &mut S) -> StoreResult<()>
    where
        V: Serialize,
        S: PropertySink + ?Sized,
    {
        let value = self.get(index).ok_or(StoreError::EmptySource { index })?;
        sink.write_value(value)
    }

    /// Read one value from `source` and store it at `index`.
    ///
    /// On error the store is left untouched.
    pub fn restore_property<S>(&mut self, index: u64, source: &mut S) -> StoreResult<()>
    where
        V: DeserializeOwned,
        S: PropertySource + ?Sized,
    {
        let value: V = source.read_value()?;
        self.put(index, value);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Apply a page's size change to the running entry count.
    fn reconcile(&mut self, before: usize, after: usize) {
        // live_count >= before, since it includes this page
        self.live_count = self.live_count + after - before;
    }

    fn compose_in(&self, page: PageId, offset: Option<u32>) -> Option<u64> {
        offset.map(|o| self.partitioner.compose(page, o))
    }
}

impl<V> fmt::Debug for ObjectPropertyStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPropertyStore")
            .field("name", &self.name)
            .field("page_bits", &self.partitioner.page_bits())
            .field("entry_count", &self.live_count)
            .field("page_count", &self.pages.page_count())
            .finish()
    }
}

fn check_range(start: u64, end: u64) -> StoreResult<()> {
    if start > end {
        return Err(StoreError::InvalidRange { start, end });
    }
    Ok(())
}
