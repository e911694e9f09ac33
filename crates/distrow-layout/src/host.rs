#![forbid(unsafe_code)]

//! What the layout needs from its host: item enumeration and geometry.

use distrow_core::geometry::{Rect, Sides};

use crate::attributes::ItemKey;

/// A scrolling container that owns the items being laid out.
pub trait LayoutHost {
    fn section_count(&self) -> usize;

    fn item_count(&self, section: usize) -> usize;

    /// Visible region in content coordinates. `x` is the scroll offset.
    fn bounds(&self) -> Rect;

    /// Insets that content should avoid (notches, toolbars).
    fn safe_area(&self) -> Sides {
        Sides::ZERO
    }

    /// Bounds minus the safe area.
    fn viewport_frame(&self) -> Rect {
        self.bounds().inner(self.safe_area())
    }

    /// Every item key in (section, row) order.
    fn item_keys(&self) -> Vec<ItemKey> {
        (0..self.section_count())
            .flat_map(|section| (0..self.item_count(section)).map(move |row| ItemKey::new(section, row)))
            .collect()
    }
}

/// Plain-data host: fixed item counts and bounds.
///
/// ```
/// use distrow_layout::{HostSnapshot, LayoutHost, Rect, Sides};
///
/// let host = HostSnapshot::new(Rect::new(0.0, 0.0, 600.0, 100.0))
///     .with_sections([2, 1])
///     .with_safe_area(Sides::horizontal(10.0));
/// assert_eq!(host.item_keys().len(), 3);
/// assert_eq!(host.viewport_frame().width, 580.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostSnapshot {
    pub counts: Vec<usize>,
    pub bounds: Rect,
    pub safe_area: Sides,
}

impl HostSnapshot {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sections(mut self, counts: impl IntoIterator<Item = usize>) -> Self {
        self.counts = counts.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_safe_area(mut self, safe_area: Sides) -> Self {
        self.safe_area = safe_area;
        self
    }

    /// Scroll horizontally to `x`.
    pub fn scroll_to(&mut self, x: f64) {
        self.bounds.x = x;
    }
}

impl LayoutHost for HostSnapshot {
    fn section_count(&self) -> usize {
        self.counts.len()
    }

    fn item_count(&self, section: usize) -> usize {
        self.counts.get(section).copied().unwrap_or(0)
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn safe_area(&self) -> Sides {
        self.safe_area
    }
}
