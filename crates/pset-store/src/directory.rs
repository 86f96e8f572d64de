use std::collections::BTreeMap;
use std::ops::RangeBounds;

use pset_types::PageId;
use tracing::trace;

use crate::page::PropertyPage;

/// Maps page ids to pages, creating pages lazily on first write.
///
/// Pages are never created by lookups and are not dropped when they empty
/// out; they live as long as the directory.
#[derive(Clone, Debug)]
pub struct PageDirectory<V> {
    pages: BTreeMap<PageId, PropertyPage<V>>,
}

impl<V> PageDirectory<V> {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    /// The page with id `page`, creating an empty one if absent.
    pub fn get_or_create(&mut self, page: PageId) -> &mut PropertyPage<V> {
        self.pages.entry(page).or_insert_with(|| {
            trace!(page = %page, "created property page");
            PropertyPage::new()
        })
    }

    /// The page with id `page`, if it has been created.
    pub fn get(&self, page: PageId) -> Option<&PropertyPage<V>> {
        self.pages.get(&page)
    }

    /// Mutable access to an existing page. Never creates.
    pub fn get_mut(&mut self, page: PageId) -> Option<&mut PropertyPage<V>> {
        self.pages.get_mut(&page)
    }

    /// Number of pages created so far, including pages that are now empty.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages in page-id order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (PageId, &PropertyPage<V>)> + '_ {
        self.pages.iter().map(|(id, page)| (*id, page))
    }

    /// Pages whose ids fall in `range`, in page-id order.
    pub fn range<R>(&self, range: R) -> impl DoubleEndedIterator<Item = (PageId, &PropertyPage<V>)> + '_
    where
        R: RangeBounds<PageId>,
    {
        self.pages.range(range).map(|(id, page)| (*id, page))
    }

    /// Consume the directory, yielding pages in page-id order.
    pub fn into_pages(self) -> impl Iterator<Item = (PageId, PropertyPage<V>)> {
        self.pages.into_iter()
    }

    /// Sum of page sizes, computed by walking every page.
    pub fn occupied_slots(&self) -> usize {
        self.pages.values().map(PropertyPage::len).sum()
    }
}

impl<V> Default for PageDirectory<V> {
    fn default() -> Self {
        Self::new()
    }
}
