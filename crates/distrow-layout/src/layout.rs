#![forbid(unsafe_code)]

//! Host-facing distributional layout.
//!
//! # Protocol
//!
//! 1. [`DistributionalLayout::prepare`] seeds a visible placeholder for every
//!    enumerated item, decides a [`Distribution`], and sweeps frames.
//! 2. The host renders the items returned by
//!    [`DistributionalLayout::items_intersecting`] and asks each one for its
//!    natural size.
//! 3. Every differing size goes through
//!    [`DistributionalLayout::report_preferred_size`], which updates the
//!    record and returns the adjustments the host must apply.
//! 4. The host calls `prepare` again. The loop ends when no item reports a
//!    size that [`DistributionalLayout::should_invalidate`] accepts.
//!
//! Distribution changes are queued and delivered only when the host drains
//! them with [`DistributionalLayout::dispatch_notifications`] or
//! [`DistributionalLayout::take_notifications`].

use std::collections::{BTreeSet, VecDeque};

use distrow_core::geometry::{Rect, Size};
use serde::{Deserialize, Serialize};

use crate::attributes::{ItemKey, ItemLayout, LayoutAttributes};
use crate::cache::CacheStats;
use crate::config::{LayoutConfig, LayoutConfigError};
use crate::distribution::{Distribution, DistributionState};
use crate::engine::DistributionEngine;
use crate::host::LayoutHost;
use crate::invalidation::{InvalidationContext, InvalidationDelta, InvalidationFlags};
use crate::store::AttributeStore;

/// Receives distribution-changed notifications.
pub trait DistributionObserver {
    fn distribution_did_change(&mut self, distribution: Distribution);
}

impl<F> DistributionObserver for F
where
    F: FnMut(Distribution),
{
    fn distribution_did_change(&mut self, distribution: Distribution) {
        self(distribution)
    }
}

/// One record in a [`LayoutSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub key: ItemKey,
    pub attributes: LayoutAttributes,
}

/// Serializable view of the layout for debug overlays and traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub state: DistributionState,
    pub content_size: Size,
    pub viewport: Rect,
    pub records: Vec<RecordSnapshot>,
}

/// Lays out a single row of items with a [`Distribution`] chosen from their
/// natural widths.
#[derive(Debug, Clone)]
pub struct DistributionalLayout {
    engine: DistributionEngine,
    /// Host bounds as of the last prepare or bounds change.
    current_bounds: Option<Rect>,
    /// Bounds minus safe area as of the last prepare.
    viewport: Rect,
    notifications: VecDeque<Distribution>,
    last_notified: Option<Distribution>,
}

impl Default for DistributionalLayout {
    fn default() -> Self {
        Self::with_valid_config(LayoutConfig::default())
    }
}

impl DistributionalLayout {
    /// Create a layout after validating `config`.
    pub fn new(config: LayoutConfig) -> Result<Self, LayoutConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: LayoutConfig) -> Self {
        Self {
            engine: DistributionEngine::new(config),
            current_bounds: None,
            viewport: Rect::ZERO,
            notifications: VecDeque::new(),
            last_notified: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &LayoutConfig {
        self.engine.config()
    }

    /// Replace the configuration and restart the protocol.
    pub fn set_config(&mut self, config: LayoutConfig) -> Result<(), LayoutConfigError> {
        config.validate()?;
        self.engine.set_config(config);
        self.last_notified = None;
        Ok(())
    }

    #[inline]
    pub fn store(&self) -> &AttributeStore {
        self.engine.store()
    }

    #[inline]
    pub fn state(&self) -> DistributionState {
        self.engine.state()
    }

    #[inline]
    pub fn distribution(&self) -> Option<Distribution> {
        self.engine.distribution()
    }

    #[inline]
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    #[inline]
    pub fn current_bounds(&self) -> Option<Rect> {
        self.current_bounds
    }

    #[inline]
    pub fn cache_stats(&self) -> CacheStats {
        self.engine.cache_stats()
    }

    /// Seed, decide, and sweep for the items `host` enumerates.
    ///
    /// Calling it again without an intervening mutation changes nothing.
    pub fn prepare(&mut self, host: &dyn LayoutHost) {
        let keys = host.item_keys();
        let _span = distrow_core::debug_span!("distrow_prepare", items = keys.len()).entered();

        self.viewport = host.viewport_frame();
        if self.current_bounds.is_none() {
            self.current_bounds = Some(host.bounds());
        }

        let enumerated: BTreeSet<ItemKey> = keys.iter().copied().collect();
        let purged = self.engine.retain(&enumerated);
        if purged > 0 {
            distrow_core::warn!(purged, "dropped records for keys the host no longer enumerates");
        }

        let seeded = self.engine.seed(keys, self.viewport.height);
        if seeded > 0 {
            distrow_core::trace!(seeded, "seeded estimates");
        }

        if let Some(distribution) = self.engine.update(self.viewport.width) {
            self.enqueue(distribution);
        }
    }

    /// Current frame of `key`, or `None` before it has a record.
    pub fn frame_for_item(&self, key: ItemKey) -> Option<Rect> {
        self.engine.store().get(key).map(|attrs| attrs.frame)
    }

    pub fn layout_for_item(&self, key: ItemKey) -> Option<ItemLayout> {
        self.engine
            .store()
            .get(key)
            .map(|attrs| ItemLayout::new(key, attrs))
    }

    /// Items whose frames overlap `rect`, in (section, row) order.
    pub fn items_intersecting(&self, rect: Rect) -> Vec<ItemLayout> {
        self.engine
            .store()
            .iter()
            .filter(|(_, attrs)| attrs.frame.intersects(&rect))
            .map(|(key, attrs)| ItemLayout::new(key, attrs))
            .collect()
    }

    /// Scrollable content size: placed widths across, viewport height down.
    pub fn content_size(&mut self) -> Size {
        Size::new(self.engine.content_size(false).width, self.viewport.height)
    }

    /// Whether a preferred size reported for `key` should be applied.
    ///
    /// Unknown keys are never applied. An item that never measured itself
    /// always is. A measured item is re-applied only while its record is
    /// tagged [`Distribution::Fill`] (or untagged) and the width changed.
    /// Once a spanning mode has placed a measured item, later changes to its
    /// natural width go unnoticed until the next full reset.
    ///
    /// Widths that are negative or not finite are never applied.
    pub fn should_invalidate(&self, key: ItemKey, _original: Rect, preferred: Rect) -> bool {
        let Some(attrs) = self.engine.store().get(key) else {
            return false;
        };
        if !is_reportable_width(preferred.width) {
            distrow_core::warn!(%key, width = preferred.width, "rejected preferred width");
            return false;
        }
        match attrs.intrinsic_width {
            None => true,
            Some(intrinsic) => {
                matches!(attrs.distribution, None | Some(Distribution::Fill))
                    && intrinsic != preferred.width
            }
        }
    }

    /// Width and offset adjustments for a size change seen in `visible_bounds`.
    pub fn invalidation_delta(
        &self,
        original: Rect,
        preferred: Rect,
        visible_bounds: Rect,
    ) -> InvalidationDelta {
        InvalidationDelta::between(original, preferred, visible_bounds)
    }

    /// Apply a self-measurement reported by the host.
    ///
    /// Returns `None` when the report is ignored (see
    /// [`Self::should_invalidate`]).
    pub fn report_preferred_size(
        &mut self,
        key: ItemKey,
        original: Rect,
        preferred: Rect,
    ) -> Option<InvalidationContext> {
        if !self.engine.store().contains(key) {
            distrow_core::warn!(%key, "preferred size reported for unknown item");
            return None;
        }
        if !self.should_invalidate(key, original, preferred) {
            return None;
        }

        let visible = self.current_bounds.unwrap_or(self.viewport);
        let delta = self.invalidation_delta(original, preferred, visible);
        let outcome = self.engine.remeasure(key, original, preferred)?;
        distrow_core::debug!(
            %key,
            width_delta = delta.width_delta,
            offset_adjustment = delta.content_offset_adjustment,
            "preferred size applied"
        );
        if let Some(distribution) = outcome.changed {
            self.enqueue(distribution);
        }
        Some(InvalidationContext::preferred_size(key, delta))
    }

    /// Apply an invalidation context.
    pub fn invalidate(&mut self, context: &InvalidationContext) {
        if context.flags.resets_store() {
            self.engine.reset();
            self.last_notified = None;
        }
    }

    /// Sections or items were inserted or removed.
    pub fn invalidate_data_source_counts(&mut self) {
        self.invalidate(&InvalidationContext::data_source_counts());
    }

    /// Whether `new_bounds` differ from the last seen bounds.
    pub fn should_invalidate_for_bounds_change(&self, new_bounds: Rect) -> bool {
        self.current_bounds != Some(new_bounds)
    }

    /// Record new host bounds.
    ///
    /// A width change drops every record so the next prepare starts over.
    /// Height-only changes and scrolling keep the records.
    pub fn bounds_did_change(&mut self, new_bounds: Rect) -> InvalidationContext {
        let width_changed = self
            .current_bounds
            .is_some_and(|bounds| bounds.width != new_bounds.width);
        self.current_bounds = Some(new_bounds);

        let mut context = InvalidationContext::new(InvalidationFlags::BOUNDS);
        if width_changed {
            distrow_core::debug!(width = new_bounds.width, "bounds width changed");
            self.engine.reset();
            context.flags |= InvalidationFlags::EVERYTHING;
        }
        context
    }

    /// Serializable view of every record.
    pub fn snapshot(&mut self) -> LayoutSnapshot {
        let content_size = self.content_size();
        LayoutSnapshot {
            state: self.engine.state(),
            content_size,
            viewport: self.viewport,
            records: self
                .engine
                .store()
                .iter()
                .map(|(key, attributes)| RecordSnapshot {
                    key,
                    attributes: *attributes,
                })
                .collect(),
        }
    }

    /// Whether notifications are waiting to be drained.
    #[inline]
    pub fn has_pending_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }

    /// Drain queued notifications in the order they were raised.
    pub fn take_notifications(&mut self) -> Vec<Distribution> {
        self.notifications.drain(..).collect()
    }

    /// Deliver queued notifications to `observer`. Returns how many were sent.
    pub fn dispatch_notifications(&mut self, observer: &mut dyn DistributionObserver) -> usize {
        let mut sent = 0;
        while let Some(distribution) = self.notifications.pop_front() {
            observer.distribution_did_change(distribution);
            sent += 1;
        }
        sent
    }

    fn enqueue(&mut self, distribution: Distribution) {
        if self.last_notified == Some(distribution) {
            return;
        }
        self.last_notified = Some(distribution);
        self.notifications.push_back(distribution);
    }
}

pub(crate) fn is_reportable_width(width: f64) -> bool {
    width.is_finite() && width >= 0.0
}
