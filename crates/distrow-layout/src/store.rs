#![forbid(unsafe_code)]

//! Attribute store: the single writer of per-item geometry.
//!
//! Every mutation that changes a record bumps [`AttributeStore::version`].
//! Derived quantities (see [`crate::cache`]) compare against this counter
//! instead of being notified, so a read always observes the latest write.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use distrow_core::geometry::Rect;

use crate::attributes::{ItemKey, LayoutAttributes};
use crate::config::LayoutConfig;
use crate::distribution::Distribution;

/// Per-item layout records keyed by [`ItemKey`].
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    config: LayoutConfig,
    records: BTreeMap<ItemKey, LayoutAttributes>,
    version: u64,
}

impl AttributeStore {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            records: BTreeMap::new(),
            version: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the configuration. Existing records are dropped because they
    /// were computed with the old insets and spacing.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.remove_all();
        self.bump();
    }

    /// Monotonic mutation counter.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[inline]
    pub fn get(&self, key: ItemKey) -> Option<&LayoutAttributes> {
        self.records.get(&key)
    }

    #[inline]
    pub fn contains(&self, key: ItemKey) -> bool {
        self.records.contains_key(&key)
    }

    /// All records in (section, row) order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemKey, &LayoutAttributes)> + '_ {
        self.records.iter().map(|(key, attrs)| (*key, attrs))
    }

    /// Records of one section in row order.
    pub fn section(&self, section: usize) -> impl Iterator<Item = (ItemKey, &LayoutAttributes)> + '_ {
        self.records
            .range(ItemKey::section_start(section)..=ItemKey::section_end(section))
            .map(|(key, attrs)| (*key, attrs))
    }

    /// Whether every record carries `distribution` as its tag.
    ///
    /// Vacuously false for an empty store.
    pub fn all_tagged(&self, distribution: Distribution) -> bool {
        !self.records.is_empty()
            && self
                .records
                .values()
                .all(|attrs| attrs.distribution == Some(distribution))
    }

    /// Insert a placeholder record.
    ///
    /// The placeholder sits at the left section inset so that it is inside
    /// the visible region and the host asks the item to measure itself.
    /// `content_height` is the viewport height; vertical insets are removed
    /// from it, falling back to the estimated height when nothing is left.
    pub fn set_estimate(&mut self, key: ItemKey, z_index: usize, content_height: f64) {
        let inset = self.config.section_inset;
        let estimate = self.config.estimated_item_size;
        let available = content_height - inset.vertical_sum();
        let height = if available > 0.0 {
            available
        } else {
            estimate.height
        };
        let attrs = LayoutAttributes {
            frame: Rect::new(inset.left, inset.top, estimate.width, height),
            intrinsic_width: None,
            z_index,
            distribution: None,
        };
        distrow_core::trace!(%key, z_index, height, "seeded estimate");
        self.records.insert(key, attrs);
        self.bump();
    }

    /// Apply a distribution decision to one record.
    ///
    /// Returns `false` if the key is unknown.
    pub fn set_placed(&mut self, key: ItemKey, x: f64, width: f64, distribution: Distribution) -> bool {
        let Some(attrs) = self.records.get_mut(&key) else {
            return false;
        };
        let tag = Some(distribution);
        if attrs.frame.x == x && attrs.frame.width == width && attrs.distribution == tag {
            return true;
        }
        attrs.frame.x = x;
        attrs.frame.width = width;
        attrs.distribution = tag;
        self.bump();
        true
    }

    /// Record a size the item reported for itself.
    ///
    /// Self-measured records are authoritative and are always tagged
    /// [`Distribution::Fill`]. Returns `false` if the key is unknown.
    pub fn set_measured(&mut self, key: ItemKey, x: f64, width: f64, z_index: usize) -> bool {
        let Some(attrs) = self.records.get_mut(&key) else {
            return false;
        };
        attrs.frame.x = x;
        attrs.frame.width = width;
        attrs.intrinsic_width = Some(width);
        attrs.z_index = z_index;
        attrs.distribution = Some(Distribution::Fill);
        self.bump();
        true
    }

    /// Move every record ordered after `key` horizontally by `dx`.
    ///
    /// Returns the number of shifted records.
    pub fn shift_after(&mut self, key: ItemKey, dx: f64) -> usize {
        if dx == 0.0 {
            return 0;
        }
        let mut shifted = 0;
        for (_, attrs) in self
            .records
            .range_mut((Bound::Excluded(key), Bound::Unbounded))
        {
            attrs.frame = attrs.frame.offset_x(dx);
            shifted += 1;
        }
        if shifted > 0 {
            self.bump();
        }
        shifted
    }

    /// Drop records whose key is not in `keys`.
    ///
    /// Returns the number of removed records.
    pub fn retain_keys(&mut self, keys: &BTreeSet<ItemKey>) -> usize {
        let before = self.records.len();
        self.records.retain(|key, _| keys.contains(key));
        let removed = before - self.records.len();
        if removed > 0 {
            self.bump();
        }
        removed
    }

    /// Bulk clear.
    pub fn remove_all(&mut self) {
        if self.records.is_empty() {
            return;
        }
        self.records.clear();
        self.bump();
    }

    #[inline]
    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distrow_core::geometry::{Sides, Size};

    fn store() -> AttributeStore {
        AttributeStore::new(LayoutConfig::default())
    }

    #[test]
    fn estimate_is_visible_placeholder() {
        let mut store = store();
        store.set_estimate(ItemKey::new(0, 0), 3, 600.0);
        let attrs = store.get(ItemKey::new(0, 0)).copied().unwrap();
        assert_eq!(attrs.frame, Rect::new(20.0, 0.0, 200.0, 600.0));
        assert_eq!(attrs.intrinsic_width, None);
        assert_eq!(attrs.z_index, 3);
        assert_eq!(attrs.distribution, None);
    }

    #[test]
    fn estimate_height_excludes_vertical_insets() {
        let config = LayoutConfig::default().with_section_inset(Sides::new(8.0, 20.0, 12.0, 20.0));
        let mut store = AttributeStore::new(config);
        store.set_estimate(ItemKey::new(0, 0), 0, 100.0);
        let frame = store.get(ItemKey::new(0, 0)).unwrap().frame;
        assert_eq!(frame.y, 8.0);
        assert_eq!(frame.height, 80.0);
    }

    #[test]
    fn estimate_height_falls_back_without_viewport() {
        let config = LayoutConfig::default().with_estimated_item_size(Size::new(120.0, 44.0));
        let mut store = AttributeStore::new(config);
        store.set_estimate(ItemKey::new(0, 0), 0, 0.0);
        assert_eq!(store.get(ItemKey::new(0, 0)).unwrap().frame.height, 44.0);
    }

    #[test]
    fn measured_records_are_tagged_fill() {
        let mut store = store();
        let key = ItemKey::new(0, 0);
        store.set_estimate(key, 0, 100.0);
        assert!(store.set_placed(key, 20.0, 275.0, Distribution::FillEqually));
        assert!(store.set_measured(key, 20.0, 80.0, 0));
        let attrs = store.get(key).unwrap();
        assert_eq!(attrs.frame.width, 80.0);
        assert_eq!(attrs.intrinsic_width, Some(80.0));
        assert_eq!(attrs.distribution, Some(Distribution::Fill));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut store = store();
        store.set_estimate(ItemKey::new(0, 0), 0, 100.0);
        let version = store.version();
        assert!(!store.set_placed(ItemKey::new(4, 4), 0.0, 1.0, Distribution::Fill));
        assert!(!store.set_measured(ItemKey::new(4, 4), 0.0, 1.0, 0));
        assert_eq!(store.version(), version);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn version_tracks_real_changes_only() {
        let mut store = store();
        let key = ItemKey::new(0, 0);
        store.set_estimate(key, 0, 100.0);
        store.set_placed(key, 20.0, 100.0, Distribution::Fill);
        let version = store.version();
        store.set_placed(key, 20.0, 100.0, Distribution::Fill);
        assert_eq!(store.version(), version);
        store.set_placed(key, 20.0, 101.0, Distribution::Fill);
        assert!(store.version() > version);
    }

    #[test]
    fn shift_after_moves_trailing_records_only() {
        let mut store = store();
        for row in 0..3 {
            store.set_estimate(ItemKey::new(0, row), row, 100.0);
        }
        store.set_estimate(ItemKey::new(1, 0), 3, 100.0);
        assert_eq!(store.shift_after(ItemKey::new(0, 1), -15.0), 2);
        assert_eq!(store.get(ItemKey::new(0, 0)).unwrap().frame.x, 20.0);
        assert_eq!(store.get(ItemKey::new(0, 1)).unwrap().frame.x, 20.0);
        assert_eq!(store.get(ItemKey::new(0, 2)).unwrap().frame.x, 5.0);
        assert_eq!(store.get(ItemKey::new(1, 0)).unwrap().frame.x, 5.0);
    }

    #[test]
    fn section_iterates_in_row_order() {
        let mut store = store();
        for (section, row) in [(1, 2), (0, 1), (1, 0), (1, 1), (0, 0)] {
            store.set_estimate(ItemKey::new(section, row), 0, 100.0);
        }
        let rows: Vec<usize> = store.section(1).map(|(key, _)| key.row).collect();
        assert_eq!(rows, [0, 1, 2]);
        assert_eq!(store.section(7).count(), 0);
    }

    #[test]
    fn retain_and_remove_all() {
        let mut store = store();
        for row in 0..4 {
            store.set_estimate(ItemKey::new(0, row), row, 100.0);
        }
        let keep: BTreeSet<ItemKey> = [ItemKey::new(0, 0), ItemKey::new(0, 3)].into();
        assert_eq!(store.retain_keys(&keep), 2);
        assert_eq!(store.len(), 2);

        store.remove_all();
        assert!(store.is_empty());
        assert!(!store.all_tagged(Distribution::Fill));
    }
}
