#![forbid(unsafe_code)]

//! Memoized aggregates over the [`AttributeStore`].
//!
//! Every entry remembers the store version it was computed at. A read whose
//! stamp differs from [`AttributeStore::version`] recomputes, so a stale value
//! can never be observed after a mutation. Entries that depend on the
//! viewport width also remember that width.
//!
//! # Numeric policy
//!
//! | Condition                   | Result                        |
//! |-----------------------------|-------------------------------|
//! | Section without items       | Zero size                     |
//! | Store without items         | Equal width over a count of 1 |
//! | Zero intrinsic total        | Proportional width 0          |
//! | Insets wider than viewport  | Available width clamps to 0   |

use std::collections::{BTreeMap, BTreeSet, HashMap};

use distrow_core::geometry::Size;

use crate::attributes::ItemKey;
use crate::store::AttributeStore;

/// Hit/miss counters for cache diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of reads served from cache (0.0 when nothing was read).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct Stamped<T> {
    version: u64,
    value: T,
}

#[derive(Debug, Clone)]
struct ViewportStamped<T> {
    version: u64,
    viewport_width: f64,
    value: T,
}

/// Aggregate cache. Not shared: one instance per layout.
#[derive(Debug, Clone, Default)]
pub struct LayoutCache {
    section_sequence: Option<Stamped<Vec<usize>>>,
    row_sequences: HashMap<usize, Stamped<Vec<usize>>>,
    section_sizes: HashMap<(usize, bool), Stamped<Size>>,
    content_sizes: HashMap<bool, Stamped<Size>>,
    max_item_width: Option<Stamped<f64>>,
    equal_item_width: Option<ViewportStamped<f64>>,
    proportional_widths: Option<ViewportStamped<BTreeMap<ItemKey, f64>>>,
    stats: CacheStats,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drop every entry.
    pub fn invalidate_all(&mut self) {
        self.section_sequence = None;
        self.row_sequences.clear();
        self.section_sizes.clear();
        self.content_sizes.clear();
        self.max_item_width = None;
        self.equal_item_width = None;
        self.proportional_widths = None;
    }

    /// Sorted, de-duplicated section indices present in the store.
    pub fn section_sequence(&mut self, store: &AttributeStore) -> Vec<usize> {
        let version = store.version();
        if let Some(entry) = self.section_sequence.as_ref().filter(|e| e.version == version) {
            self.stats.hits += 1;
            return entry.value.clone();
        }
        self.miss("section_sequence");
        let sections: BTreeSet<usize> = store.iter().map(|(key, _)| key.section).collect();
        let value: Vec<usize> = sections.into_iter().collect();
        self.section_sequence = Some(Stamped {
            version,
            value: value.clone(),
        });
        value
    }

    /// Sorted row indices present in `section`.
    pub fn row_sequence(&mut self, store: &AttributeStore, section: usize) -> Vec<usize> {
        let version = store.version();
        if let Some(entry) = self
            .row_sequences
            .get(&section)
            .filter(|e| e.version == version)
        {
            self.stats.hits += 1;
            return entry.value.clone();
        }
        self.miss("row_sequence");
        let rows: BTreeSet<usize> = store.section(section).map(|(key, _)| key.row).collect();
        let value: Vec<usize> = rows.into_iter().collect();
        self.row_sequences.insert(
            section,
            Stamped {
                version,
                value: value.clone(),
            },
        );
        value
    }

    /// Width and height of one section including spacing and insets.
    pub fn section_size(
        &mut self,
        store: &AttributeStore,
        section: usize,
        use_intrinsic: bool,
    ) -> Size {
        let version = store.version();
        let key = (section, use_intrinsic);
        if let Some(entry) = self.section_sizes.get(&key).filter(|e| e.version == version) {
            self.stats.hits += 1;
            return entry.value;
        }
        self.miss("section_size");
        let value = compute_section_size(store, section, use_intrinsic);
        self.section_sizes.insert(key, Stamped { version, value });
        value
    }

    #[inline]
    pub fn section_width(
        &mut self,
        store: &AttributeStore,
        section: usize,
        use_intrinsic: bool,
    ) -> f64 {
        self.section_size(store, section, use_intrinsic).width
    }

    /// Sum of section widths; height is the tallest section.
    pub fn content_size(&mut self, store: &AttributeStore, use_intrinsic: bool) -> Size {
        let version = store.version();
        if let Some(entry) = self
            .content_sizes
            .get(&use_intrinsic)
            .filter(|e| e.version == version)
        {
            self.stats.hits += 1;
            return entry.value;
        }
        self.miss("content_size");
        let mut value = Size::ZERO;
        for section in self.section_sequence(store) {
            let size = self.section_size(store, section, use_intrinsic);
            value.width += size.width;
            value.height = value.height.max(size.height);
        }
        self.content_sizes
            .insert(use_intrinsic, Stamped { version, value });
        value
    }

    /// Widest natural item width (0 for an empty store).
    pub fn max_item_width(&mut self, store: &AttributeStore) -> f64 {
        let version = store.version();
        if let Some(entry) = self.max_item_width.as_ref().filter(|e| e.version == version) {
            self.stats.hits += 1;
            return entry.value;
        }
        self.miss("max_item_width");
        let value = store
            .iter()
            .map(|(_, attrs)| attrs.natural_width())
            .fold(0.0, f64::max);
        self.max_item_width = Some(Stamped { version, value });
        value
    }

    /// Width each item gets when the viewport is split evenly.
    pub fn equal_item_width(&mut self, store: &AttributeStore, viewport_width: f64) -> f64 {
        let version = store.version();
        if let Some(entry) = self
            .equal_item_width
            .as_ref()
            .filter(|e| e.version == version && e.viewport_width == viewport_width)
        {
            self.stats.hits += 1;
            return entry.value;
        }
        self.miss("equal_item_width");
        let count = store.len().max(1) as f64;
        let value = available_width(store, viewport_width) / count;
        self.equal_item_width = Some(ViewportStamped {
            version,
            viewport_width,
            value,
        });
        value
    }

    /// Per-item widths proportional to natural widths.
    ///
    /// Sections first receive a share of the available width proportional to
    /// their natural totals; items then split their section's share by the
    /// same rule.
    pub fn proportional_widths(
        &mut self,
        store: &AttributeStore,
        viewport_width: f64,
    ) -> BTreeMap<ItemKey, f64> {
        let version = store.version();
        if let Some(entry) = self
            .proportional_widths
            .as_ref()
            .filter(|e| e.version == version && e.viewport_width == viewport_width)
        {
            self.stats.hits += 1;
            return entry.value.clone();
        }
        self.miss("proportional_widths");

        let available = available_width(store, viewport_width);
        let total: f64 = store.iter().map(|(_, attrs)| attrs.natural_width()).sum();
        let mut value = BTreeMap::new();
        for section in self.section_sequence(store) {
            let section_total: f64 = store
                .section(section)
                .map(|(_, attrs)| attrs.natural_width())
                .sum();
            let section_available = ratio(section_total, total) * available;
            for (key, attrs) in store.section(section) {
                let width = ratio(attrs.natural_width(), section_total) * section_available;
                value.insert(key, width);
            }
        }

        self.proportional_widths = Some(ViewportStamped {
            version,
            viewport_width,
            value: value.clone(),
        });
        value
    }

    fn miss(&mut self, _entry: &'static str) {
        self.stats.misses += 1;
        distrow_core::trace!(entry = _entry, "layout cache miss");
    }
}

fn compute_section_size(store: &AttributeStore, section: usize, use_intrinsic: bool) -> Size {
    let config = store.config();
    let mut count = 0usize;
    let mut items_width = 0.0;
    let mut tallest: f64 = 0.0;
    for (_, attrs) in store.section(section) {
        count += 1;
        items_width += attrs.width(use_intrinsic);
        tallest = tallest.max(attrs.frame.height);
    }
    if count == 0 {
        return Size::ZERO;
    }
    let inset = config.section_inset;
    let spacing = config.item_spacing * (count - 1) as f64;
    Size::new(
        items_width + spacing + inset.horizontal_sum(),
        tallest + inset.vertical_sum(),
    )
}

/// Viewport width minus every section's insets and inter-item spacing.
fn available_width(store: &AttributeStore, viewport_width: f64) -> f64 {
    let config = store.config();
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for (key, _) in store.iter() {
        *counts.entry(key.section).or_default() += 1;
    }
    let gutters: f64 = counts
        .values()
        .map(|count| {
            config.section_inset.horizontal_sum() + config.item_spacing * (count - 1) as f64
        })
        .sum();
    (viewport_width - gutters).max(0.0)
}

#[inline]
fn ratio(part: f64, total: f64) -> f64 {
    if total > 0.0 { part / total } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::distribution::Distribution;

    fn store_with_widths(sections: &[&[f64]]) -> AttributeStore {
        let mut store = AttributeStore::new(LayoutConfig::default());
        let mut z = 0;
        for (section, widths) in sections.iter().enumerate() {
            for (row, width) in widths.iter().enumerate() {
                let key = ItemKey::new(section, row);
                store.set_estimate(key, z, 100.0);
                store.set_measured(key, 0.0, *width, z);
                z += 1;
            }
        }
        store
    }

    #[test]
    fn sequences_are_sorted_and_unique() {
        let mut store = AttributeStore::new(LayoutConfig::default());
        for (section, row) in [(2, 1), (0, 3), (2, 0), (0, 1), (5, 0)] {
            store.set_estimate(ItemKey::new(section, row), 0, 100.0);
        }
        let mut cache = LayoutCache::new();
        assert_eq!(cache.section_sequence(&store), [0, 2, 5]);
        assert_eq!(cache.row_sequence(&store, 0), [1, 3]);
        assert_eq!(cache.row_sequence(&store, 2), [0, 1]);
        assert!(cache.row_sequence(&store, 9).is_empty());
    }

    #[test]
    fn section_width_includes_spacing_and_insets() {
        let store = store_with_widths(&[&[100.0, 50.0, 25.0]]);
        let mut cache = LayoutCache::new();
        // 175 + 2 * 10 + 20 + 20
        assert_eq!(cache.section_width(&store, 0, true), 235.0);
        assert_eq!(cache.section_width(&store, 3, true), 0.0);
    }

    #[test]
    fn content_size_sums_sections() {
        let store = store_with_widths(&[&[100.0], &[50.0, 50.0]]);
        let mut cache = LayoutCache::new();
        let size = cache.content_size(&store, true);
        assert_eq!(size.width, 140.0 + 150.0);
        assert_eq!(size.height, 100.0);
    }

    #[test]
    fn intrinsic_and_placed_widths_differ() {
        let mut store = store_with_widths(&[&[100.0, 50.0]]);
        store.set_placed(ItemKey::new(0, 0), 20.0, 300.0, Distribution::FillProportionally);
        let mut cache = LayoutCache::new();
        assert_eq!(cache.content_size(&store, true).width, 100.0 + 50.0 + 50.0);
        assert_eq!(cache.content_size(&store, false).width, 300.0 + 50.0 + 50.0);
    }

    #[test]
    fn equal_width_splits_available_space() {
        let store = store_with_widths(&[&[10.0, 10.0, 10.0, 10.0]]);
        let mut cache = LayoutCache::new();
        // (600 - 40 - 30) / 4
        assert_eq!(cache.equal_item_width(&store, 600.0), 132.5);
    }

    #[test]
    fn equal_width_of_empty_store_is_finite() {
        let store = AttributeStore::new(LayoutConfig::default());
        let mut cache = LayoutCache::new();
        let width = cache.equal_item_width(&store, 600.0);
        assert!(width.is_finite());
        assert_eq!(width, 600.0);
        assert_eq!(cache.max_item_width(&store), 0.0);
        assert_eq!(cache.content_size(&store, true), Size::ZERO);
    }

    #[test]
    fn proportional_widths_preserve_ratio() {
        let store = store_with_widths(&[&[225.0, 75.0]]);
        let mut cache = LayoutCache::new();
        let widths = cache.proportional_widths(&store, 600.0);
        assert_eq!(widths[&ItemKey::new(0, 0)], 412.5);
        assert_eq!(widths[&ItemKey::new(0, 1)], 137.5);
        let total = 20.0 + widths.values().sum::<f64>() + 10.0 + 20.0;
        assert_eq!(total, 600.0);
    }

    #[test]
    fn proportional_widths_across_sections() {
        let store = store_with_widths(&[&[100.0], &[300.0]]);
        let mut cache = LayoutCache::new();
        let widths = cache.proportional_widths(&store, 480.0);
        // 480 - 2 * 40 = 400 available, split 1:3 between sections.
        assert_eq!(widths[&ItemKey::new(0, 0)], 100.0);
        assert_eq!(widths[&ItemKey::new(1, 0)], 300.0);
    }

    #[test]
    fn proportional_widths_with_zero_total_are_zero() {
        let store = store_with_widths(&[&[0.0, 0.0]]);
        let mut cache = LayoutCache::new();
        let widths = cache.proportional_widths(&store, 600.0);
        assert!(widths.values().all(|w| *w == 0.0));
    }

    #[test]
    fn reads_hit_until_store_mutates() {
        let mut store = store_with_widths(&[&[100.0, 50.0]]);
        let mut cache = LayoutCache::new();
        assert_eq!(cache.max_item_width(&store), 100.0);
        assert_eq!(cache.max_item_width(&store), 100.0);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });

        store.set_measured(ItemKey::new(0, 1), 130.0, 180.0, 1);
        assert_eq!(cache.max_item_width(&store), 180.0);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn viewport_change_recomputes_equal_width() {
        let store = store_with_widths(&[&[10.0, 10.0]]);
        let mut cache = LayoutCache::new();
        assert_eq!(cache.equal_item_width(&store, 250.0), 100.0);
        assert_eq!(cache.equal_item_width(&store, 450.0), 200.0);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn invalidate_all_forces_recompute() {
        let store = store_with_widths(&[&[10.0]]);
        let mut cache = LayoutCache::new();
        cache.section_sequence(&store);
        cache.invalidate_all();
        cache.section_sequence(&store);
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2 });
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }
}
