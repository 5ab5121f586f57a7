//! Ordered filter stage

use tracing::debug;

use super::log::FilterLog;
use super::types::{FilterRecord, Filterable, NamedFilter, Result};
use crate::normalize::PageInfo;

/// Registered predicates applied in order; the first rejection wins
pub struct FilterStage<T> {
    filters: Vec<NamedFilter<T>>,
}

impl<T> Default for FilterStage<T> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
        }
    }
}

impl<T> std::fmt::Debug for FilterStage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStage")
            .field(
                "filters",
                &self.filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T: Filterable> FilterStage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append filters after the ones already registered
    pub fn register(&mut self, filters: impl IntoIterator<Item = NamedFilter<T>>) {
        self.filters.extend(filters);
    }

    pub fn push(&mut self, filter: NamedFilter<T>) {
        self.filters.push(filter);
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(NamedFilter::name).collect()
    }

    /// Keep the items every filter accepts, logging each rejection.
    ///
    /// A failing predicate aborts immediately with the items seen so far
    /// discarded.
    pub fn apply(&self, items: Vec<T>, page: &PageInfo, log: &mut FilterLog) -> Result<Vec<T>> {
        if self.filters.is_empty() {
            return Ok(items);
        }

        let total = items.len();
        let mut kept = Vec::with_capacity(total);
        'items: for item in items {
            for filter in &self.filters {
                if !filter.check(&item, page)? {
                    log.record(FilterRecord::new(filter.name(), &item, page))?;
                    continue 'items;
                }
            }
            kept.push(item);
        }

        let kind = T::KIND;
        debug!(
            kind = %kind,
            page = page.page_number,
            kept = kept.len(),
            dropped = total - kept.len(),
            "applied filters"
        );
        Ok(kept)
    }
}
