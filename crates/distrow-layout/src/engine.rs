#![forbid(unsafe_code)]

//! Distribution decision and placement.
//!
//! # Decision Rule
//!
//! 1) If the natural content width fits the viewport and no item is wider
//!    than an equal split would make it, use [`Distribution::FillEqually`].
//! 2) If it fits but some item is wider than the equal split, use
//!    [`Distribution::FillProportionally`].
//! 3) Otherwise use [`Distribution::Fill`] and let the host scroll.
//!
//! # Placement
//!
//! A single left-to-right sweep in (section, row) order assigns every x
//! origin. Each section starts at the previous section's trailing edge plus
//! its own left inset; items are separated by the configured spacing and the
//! right inset closes the section.
//!
//! # Invariants
//!
//! - The decision is sticky: it is recomputed only after the store changed
//!   or the viewport width changed since the last sweep.
//! - A self-measured record is always tagged [`Distribution::Fill`].
//! - Once every record is tagged `Fill`, the instance state is `Fill`.

use std::collections::{BTreeMap, BTreeSet};

use distrow_core::geometry::{Rect, Size};

use crate::attributes::ItemKey;
use crate::cache::{CacheStats, LayoutCache};
use crate::config::LayoutConfig;
use crate::distribution::{Distribution, DistributionState};
use crate::store::AttributeStore;

/// Pick a distribution from aggregate widths.
///
/// `content_width` must be computed from natural (intrinsic) widths. A
/// content width exactly equal to the viewport width still fits.
pub fn preferred_distribution(
    content_width: f64,
    viewport_width: f64,
    max_item_width: f64,
    equal_item_width: f64,
) -> Distribution {
    if content_width <= viewport_width {
        if max_item_width <= equal_item_width {
            Distribution::FillEqually
        } else {
            Distribution::FillProportionally
        }
    } else {
        Distribution::Fill
    }
}

/// Result of applying a self-measurement report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Remeasurement {
    /// `original.width - preferred.width`.
    pub width_delta: f64,
    /// Number of trailing records that moved.
    pub shifted: usize,
    /// New instance state when the report flipped it.
    pub changed: Option<Distribution>,
}

/// Owns the attribute store, its cache, and the instance distribution state.
#[derive(Debug, Clone, Default)]
pub struct DistributionEngine {
    store: AttributeStore,
    cache: LayoutCache,
    state: DistributionState,
    /// Store version and viewport width right after the last sweep.
    settled: Option<(u64, f64)>,
}

impl DistributionEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            store: AttributeStore::new(config),
            ..Self::default()
        }
    }

    #[inline]
    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    #[inline]
    pub fn config(&self) -> &LayoutConfig {
        self.store.config()
    }

    #[inline]
    pub fn state(&self) -> DistributionState {
        self.state
    }

    #[inline]
    pub fn distribution(&self) -> Option<Distribution> {
        self.state.distribution()
    }

    #[inline]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Replace the configuration and start over.
    pub fn set_config(&mut self, config: LayoutConfig) {
        self.store.set_config(config);
        self.reset();
    }

    /// Drop every record and return to [`DistributionState::Unset`].
    pub fn reset(&mut self) {
        distrow_core::debug!(records = self.store.len(), "distribution reset");
        self.store.remove_all();
        self.cache.invalidate_all();
        self.state = DistributionState::Unset;
        self.settled = None;
    }

    /// Drop records whose keys the host no longer enumerates.
    pub fn retain(&mut self, keys: &BTreeSet<ItemKey>) -> usize {
        self.store.retain_keys(keys)
    }

    /// Seed placeholder records for keys without one.
    ///
    /// `keys` must be in enumeration order; a new record's z-index is its
    /// position in that order. Returns the number of seeded records.
    pub fn seed<I>(&mut self, keys: I, content_height: f64) -> usize
    where
        I: IntoIterator<Item = ItemKey>,
    {
        let mut seeded = 0;
        for (z_index, key) in keys.into_iter().enumerate() {
            if !self.store.contains(key) {
                self.store.set_estimate(key, z_index, content_height);
                seeded += 1;
            }
        }
        seeded
    }

    /// Decide the distribution for the current records.
    pub fn decide(&mut self, viewport_width: f64) -> Distribution {
        let content_width = self.cache.content_size(&self.store, true).width;
        let max_item_width = self.cache.max_item_width(&self.store);
        let equal_item_width = self.cache.equal_item_width(&self.store, viewport_width);
        let distribution = preferred_distribution(
            content_width,
            viewport_width,
            max_item_width,
            equal_item_width,
        );
        distrow_core::debug!(
            %distribution,
            content_width,
            viewport_width,
            max_item_width,
            equal_item_width,
            "distribution decided"
        );
        distribution
    }

    /// Sweep every record into place under `distribution`.
    pub fn place(&mut self, distribution: Distribution, viewport_width: f64) {
        let config = *self.store.config();
        let inset = config.section_inset;
        let spacing = config.item_spacing;

        let equal_width = match distribution {
            Distribution::FillEqually => self.cache.equal_item_width(&self.store, viewport_width),
            _ => 0.0,
        };
        let proportional = match distribution {
            Distribution::FillProportionally => {
                self.cache.proportional_widths(&self.store, viewport_width)
            }
            _ => BTreeMap::new(),
        };

        let mut section_origin = 0.0;
        for section in self.cache.section_sequence(&self.store) {
            let items: Vec<(ItemKey, f64)> = self
                .store
                .section(section)
                .map(|(key, attrs)| (key, attrs.natural_width()))
                .collect();
            if items.is_empty() {
                continue;
            }

            let mut cursor = section_origin + inset.left;
            for (key, natural_width) in items {
                let width = match distribution {
                    Distribution::Fill => natural_width,
                    Distribution::FillEqually => equal_width,
                    Distribution::FillProportionally => {
                        proportional.get(&key).copied().unwrap_or(0.0)
                    }
                };
                self.store.set_placed(key, cursor, width, distribution);
                cursor += width + spacing;
            }
            section_origin = cursor - spacing + inset.right;
        }
        distrow_core::trace!(%distribution, content_width = section_origin, "sweep complete");
    }

    /// Decide and sweep unless nothing changed since the last sweep.
    ///
    /// Returns the new distribution when the instance state changed.
    pub fn update(&mut self, viewport_width: f64) -> Option<Distribution> {
        if self.store.is_empty() {
            return None;
        }
        if !self.state.is_unset() && self.settled == Some((self.store.version(), viewport_width)) {
            return None;
        }

        let distribution = self.decide(viewport_width);
        self.place(distribution, viewport_width);
        self.settled = Some((self.store.version(), viewport_width));

        let next = DistributionState::Decided(distribution);
        let previous = std::mem::replace(&mut self.state, next);
        (previous != next).then_some(distribution)
    }

    /// Apply a size the item reported for itself.
    ///
    /// Trailing records move by the width difference so nothing overlaps or
    /// leaves a gap, and the record is overwritten with the measured width.
    /// Returns `None` for keys without a record and for widths that are
    /// negative or not finite.
    pub fn remeasure(
        &mut self,
        key: ItemKey,
        original: Rect,
        preferred: Rect,
    ) -> Option<Remeasurement> {
        let z_index = self.store.get(key)?.z_index;
        if !crate::layout::is_reportable_width(preferred.width) {
            return None;
        }
        let width_delta = original.width - preferred.width;
        let shifted = self.store.shift_after(key, -width_delta);
        self.store
            .set_measured(key, preferred.x, preferred.width, z_index);
        self.cache.invalidate_all();

        let mut changed = None;
        if self.store.all_tagged(Distribution::Fill)
            && self.state != DistributionState::Decided(Distribution::Fill)
        {
            self.state = DistributionState::Decided(Distribution::Fill);
            changed = Some(Distribution::Fill);
        }
        distrow_core::debug!(%key, width_delta, shifted, "item remeasured");

        Some(Remeasurement {
            width_delta,
            shifted,
            changed,
        })
    }

    /// Content size using placed (`false`) or natural (`true`) widths.
    pub fn content_size(&mut self, use_intrinsic: bool) -> Size {
        self.cache.content_size(&self.store, use_intrinsic)
    }

    pub fn section_sequence(&mut self) -> Vec<usize> {
        self.cache.section_sequence(&self.store)
    }

    pub fn row_sequence(&mut self, section: usize) -> Vec<usize> {
        self.cache.row_sequence(&self.store, section)
    }

    pub fn section_width(&mut self, section: usize, use_intrinsic: bool) -> f64 {
        self.cache.section_width(&self.store, section, use_intrinsic)
    }

    pub fn max_item_width(&mut self) -> f64 {
        self.cache.max_item_width(&self.store)
    }

    pub fn equal_item_width(&mut self, viewport_width: f64) -> f64 {
        self.cache.equal_item_width(&self.store, viewport_width)
    }

    pub fn proportional_widths(&mut self, viewport_width: f64) -> BTreeMap<ItemKey, f64> {
        self.cache.proportional_widths(&self.store, viewport_width)
    }
}
