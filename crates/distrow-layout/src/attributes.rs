#![forbid(unsafe_code)]

//! Per-item keys and layout records.

use std::fmt;

use distrow_core::geometry::Rect;
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;

/// Position of an item in the host's enumeration.
///
/// Ordering is (section, row) ascending, which is also placement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub section: usize,
    pub row: usize,
}

impl ItemKey {
    #[inline]
    pub const fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }

    /// First possible key in `section`.
    #[inline]
    pub(crate) const fn section_start(section: usize) -> Self {
        Self::new(section, 0)
    }

    /// Last possible key in `section`.
    #[inline]
    pub(crate) const fn section_end(section: usize) -> Self {
        Self::new(section, usize::MAX)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.row)
    }
}

impl From<(usize, usize)> for ItemKey {
    fn from((section, row): (usize, usize)) -> Self {
        Self::new(section, row)
    }
}

/// Geometry record for one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutAttributes {
    /// Last authoritative placement.
    pub frame: Rect,
    /// Self-measured natural width; `None` while only an estimate exists.
    pub intrinsic_width: Option<f64>,
    /// Paint order. Assigned from the enumeration index when first seen.
    pub z_index: usize,
    /// Strategy that produced `frame.width`, if any.
    pub distribution: Option<Distribution>,
}

impl LayoutAttributes {
    /// Whether the item has reported its own size.
    #[inline]
    pub fn is_measured(&self) -> bool {
        self.intrinsic_width.is_some()
    }

    /// Intrinsic width when known, otherwise the placed width.
    #[inline]
    pub fn natural_width(&self) -> f64 {
        self.intrinsic_width.unwrap_or(self.frame.width)
    }

    /// Width used by aggregate math.
    #[inline]
    pub fn width(&self, use_intrinsic: bool) -> f64 {
        if use_intrinsic {
            self.natural_width()
        } else {
            self.frame.width
        }
    }
}

/// Host-facing view of one placed item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemLayout {
    pub key: ItemKey,
    pub frame: Rect,
    pub z_index: usize,
}

impl ItemLayout {
    pub(crate) fn new(key: ItemKey, attributes: &LayoutAttributes) -> Self {
        Self {
            key,
            frame: attributes.frame,
            z_index: attributes.z_index,
        }
    }
}
