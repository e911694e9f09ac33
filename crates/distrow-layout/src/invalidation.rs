#![forbid(unsafe_code)]

//! Invalidation contexts produced by preferred-size reports and host events.

use bitflags::bitflags;
use distrow_core::geometry::Rect;

use crate::attributes::ItemKey;

bitflags! {
    /// What a layout invalidation covers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InvalidationFlags: u8 {
        /// An item reported a preferred size that differs from its frame.
        const PREFERRED_SIZE = 0b0001;
        /// The host bounds changed.
        const BOUNDS = 0b0010;
        /// Sections or items were added or removed. Forces a full reset.
        const DATA_SOURCE_COUNTS = 0b0100;
        /// Everything must be recomputed.
        const EVERYTHING = 0b1000;
    }
}

impl InvalidationFlags {
    /// Whether applying these flags drops every stored record.
    #[inline]
    pub fn resets_store(self) -> bool {
        self.intersects(Self::DATA_SOURCE_COUNTS | Self::EVERYTHING)
    }
}

/// Width bookkeeping for one preferred-size report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InvalidationDelta {
    /// `original.width - preferred.width`.
    pub width_delta: f64,
    /// Change applied to the content width (`-width_delta`).
    pub content_width_adjustment: f64,
    /// Change applied to the horizontal content offset.
    pub content_offset_adjustment: f64,
}

impl InvalidationDelta {
    /// Compute the adjustments for an item whose frame changed from
    /// `original` to `preferred` while `visible_bounds` is on screen.
    ///
    /// The offset only moves when the item starts left of the visible
    /// region, and then it moves with the content so what is on screen stays
    /// put.
    pub fn between(original: Rect, preferred: Rect, visible_bounds: Rect) -> Self {
        let width_delta = original.width - preferred.width;
        let content_offset_adjustment = if preferred.x < visible_bounds.x {
            -width_delta
        } else {
            0.0
        };
        Self {
            width_delta,
            content_width_adjustment: -width_delta,
            content_offset_adjustment,
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.width_delta == 0.0
    }
}

/// Result of an invalidation request, applied with
/// [`crate::DistributionalLayout::invalidate`].
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidationContext {
    pub flags: InvalidationFlags,
    pub invalidated_items: Vec<ItemKey>,
    pub content_size_adjustment: f64,
    pub content_offset_adjustment: f64,
}

impl InvalidationContext {
    pub fn new(flags: InvalidationFlags) -> Self {
        Self {
            flags,
            invalidated_items: Vec::new(),
            content_size_adjustment: 0.0,
            content_offset_adjustment: 0.0,
        }
    }

    /// Context for item-count changes.
    pub fn data_source_counts() -> Self {
        Self::new(InvalidationFlags::DATA_SOURCE_COUNTS)
    }

    /// Context for a preferred-size report on `key`.
    pub fn preferred_size(key: ItemKey, delta: InvalidationDelta) -> Self {
        Self {
            flags: InvalidationFlags::PREFERRED_SIZE,
            invalidated_items: vec![key],
            content_size_adjustment: delta.content_width_adjustment,
            content_offset_adjustment: delta.content_offset_adjustment,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: InvalidationFlags) -> Self {
        self.flags |= flags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrink_inside_visible_bounds_keeps_offset() {
        let delta = InvalidationDelta::between(
            Rect::new(20.0, 0.0, 200.0, 44.0),
            Rect::new(20.0, 0.0, 80.0, 44.0),
            Rect::new(0.0, 0.0, 600.0, 44.0),
        );
        assert_eq!(delta.width_delta, 120.0);
        assert_eq!(delta.content_width_adjustment, -120.0);
        assert_eq!(delta.content_offset_adjustment, 0.0);
    }

    #[test]
    fn shrink_left_of_visible_bounds_moves_offset_with_content() {
        let delta = InvalidationDelta::between(
            Rect::new(20.0, 0.0, 200.0, 44.0),
            Rect::new(20.0, 0.0, 80.0, 44.0),
            Rect::new(300.0, 0.0, 600.0, 44.0),
        );
        assert_eq!(delta.content_offset_adjustment, -120.0);

        let grow = InvalidationDelta::between(
            Rect::new(20.0, 0.0, 80.0, 44.0),
            Rect::new(20.0, 0.0, 200.0, 44.0),
            Rect::new(300.0, 0.0, 600.0, 44.0),
        );
        assert_eq!(grow.content_width_adjustment, 120.0);
        assert_eq!(grow.content_offset_adjustment, 120.0);
    }

    #[test]
    fn flags_that_reset() {
        assert!(InvalidationFlags::DATA_SOURCE_COUNTS.resets_store());
        assert!(InvalidationFlags::EVERYTHING.resets_store());
        assert!(!(InvalidationFlags::PREFERRED_SIZE | InvalidationFlags::BOUNDS).resets_store());
    }

    #[test]
    fn preferred_size_context_carries_key_and_adjustments() {
        let key = ItemKey::new(0, 2);
        let delta = InvalidationDelta {
            width_delta: 10.0,
            content_width_adjustment: -10.0,
            content_offset_adjustment: 0.0,
        };
        let context = InvalidationContext::preferred_size(key, delta)
            .with_flags(InvalidationFlags::BOUNDS);
        assert_eq!(context.invalidated_items, [key]);
        assert_eq!(context.content_size_adjustment, -10.0);
        assert!(context.flags.contains(InvalidationFlags::PREFERRED_SIZE | InvalidationFlags::BOUNDS));
    }
}
