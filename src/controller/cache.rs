//! Packed pages reused across passes

use crate::layout::{Page, PageMetrics, Segment};
use rustc_hash::{FxHashMap, FxHashSet};

/// Cache key: segment position plus a hash of its content
pub type SegmentKey = (usize, u64);

#[derive(Debug)]
struct Entry {
    segment: Segment,
    pages: Vec<Page>,
}

/// Explicit per-segment page cache.
///
/// Entries are only valid for the metrics they were packed under; a pass
/// with different metrics starts from an empty cache. Entries that a pass
/// does not look up are evicted when the pass ends. A hit also requires the
/// stored segment to equal the one being packed, so a hash collision is a
/// miss.
#[derive(Debug, Default)]
pub struct SegmentCache {
    metrics: Option<PageMetrics>,
    entries: FxHashMap<SegmentKey, Entry>,
    touched: FxHashSet<SegmentKey>,
    hits: usize,
    misses: usize,
}

impl SegmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a pass under `metrics`
    pub fn begin_pass(&mut self, metrics: PageMetrics) {
        if self.metrics != Some(metrics) {
            if !self.entries.is_empty() {
                log::debug!("Page metrics changed; dropping {} cached segments", self.entries.len());
            }
            self.entries.clear();
            self.metrics = Some(metrics);
        }
        self.touched.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Look up packed pages for `segment`
    pub fn get(&mut self, key: SegmentKey, segment: &Segment) -> Option<&[Page]> {
        match self.entries.get(&key) {
            Some(entry) if entry.segment == *segment => {
                self.touched.insert(key);
                self.hits += 1;
                Some(entry.pages.as_slice())
            }
            Some(_) => {
                log::debug!("Segment hash collision at index {}", key.0);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: SegmentKey, segment: Segment, pages: Vec<Page>) {
        self.touched.insert(key);
        self.entries.insert(key, Entry { segment, pages });
    }

    /// Finish a pass, evicting segments the pass no longer has
    pub fn end_pass(&mut self) {
        let touched = &self.touched;
        self.entries.retain(|key, _| touched.contains(key));
    }

    /// Forget everything, e.g. after a theme change the metrics do not show
    pub fn clear(&mut self) {
        self.metrics = None;
        self.entries.clear();
        self.touched.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hits and misses of the current or last pass
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}
