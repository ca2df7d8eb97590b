//! Ordered filter chains and their composition

use crate::filter::{Capabilities, Capability, DebugLevel, Filter};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// A filter together with the properties probed when it joined a chain
#[derive(Clone)]
pub struct FilterEntry {
    filter: Arc<dyn Filter>,
    capabilities: Capabilities,
    identity: String,
    max_debug_level: Option<DebugLevel>,
}

impl FilterEntry {
    pub fn new(filter: Arc<dyn Filter>) -> Self {
        Self {
            capabilities: filter.capabilities(),
            identity: filter.identity(),
            max_debug_level: filter.max_debug_level(),
            filter,
        }
    }

    pub fn filter(&self) -> &dyn Filter {
        self.filter.as_ref()
    }

    pub fn name(&self) -> &str {
        self.filter.name()
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn max_debug_level(&self) -> Option<DebugLevel> {
        self.max_debug_level
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

/// Filters are equal when they share a name and identity
impl PartialEq for FilterEntry {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.identity == other.identity
    }
}

impl Eq for FilterEntry {}

impl fmt::Debug for FilterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Filter {}>", self.identity)
    }
}

/// An ordered list of filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    entries: Vec<FilterEntry>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: Arc<dyn Filter>) {
        self.entries.push(FilterEntry::new(filter));
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, filter: Arc<dyn Filter>) -> Self {
        self.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterEntry> {
        self.entries.iter()
    }

    pub fn contains(&self, entry: &FilterEntry) -> bool {
        self.entries.contains(entry)
    }

    /// Filters implementing `capability`, in chain order
    pub fn supporting(&self, capability: Capability) -> FilterChain {
        self.entries
            .iter()
            .filter(|e| e.supports(capability))
            .cloned()
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name().to_string()).collect()
    }

    pub fn identities(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.identity()).collect()
    }
}

impl FromIterator<FilterEntry> for FilterChain {
    fn from_iter<I: IntoIterator<Item = FilterEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<Arc<dyn Filter>> for FilterChain {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Filter>>>(iter: I) -> Self {
        iter.into_iter().map(FilterEntry::new).collect()
    }
}

impl<'a> IntoIterator for &'a FilterChain {
    type Item = &'a FilterEntry;
    type IntoIter = std::slice::Iter<'a, FilterEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Merge two filter lists into one.
///
/// The result is `primary` unchanged, followed by each filter of `secondary`
/// that does not already appear in the result. Pass the more specific list
/// (a bundle's own filters) as `primary` and the inherited one as
/// `secondary`.
pub fn merge_filter_lists(primary: &FilterChain, secondary: &FilterChain) -> FilterChain {
    let mut result = primary.clone();
    for entry in secondary {
        if !result.contains(entry) {
            result.entries.push(entry.clone());
        }
    }
    result
}

/// Filters that should run at debug `level`
pub fn select_filters(filters: &FilterChain, level: DebugLevel) -> FilterChain {
    select_filters_by(filters, level, DebugLevel::cmp)
}

/// Filters that should run at debug `level`, ordering levels with `cmp`.
///
/// A filter without a threshold always runs; otherwise it runs when `level`
/// compares at or below its threshold.
pub fn select_filters_by<F>(filters: &FilterChain, level: DebugLevel, cmp: F) -> FilterChain
where
    F: Fn(&DebugLevel, &DebugLevel) -> Ordering,
{
    filters
        .iter()
        .filter(|e| match e.max_debug_level() {
            None => true,
            Some(threshold) => cmp(&level, &threshold) != Ordering::Greater,
        })
        .cloned()
        .collect()
}
