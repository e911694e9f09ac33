#![forbid(unsafe_code)]

//! Distributional row layout.
//!
//! Places a single horizontal row of variable-width items, grouped into
//! sections, using one of three strategies:
//!
//! - [`Distribution::Fill`] - natural widths; the row may overflow and scroll
//! - [`Distribution::FillEqually`] - equal widths spanning the viewport
//! - [`Distribution::FillProportionally`] - widths scaled from natural widths
//!   to span the viewport
//!
//! Items start out as visible placeholders, measure themselves, and report
//! their natural widths back. The strategy is then chosen from those widths.
//!
//! ```
//! use distrow_layout::{Distribution, DistributionalLayout, HostSnapshot, ItemKey, Rect};
//!
//! let host = HostSnapshot::new(Rect::new(0.0, 0.0, 600.0, 44.0)).with_sections([2]);
//! let mut layout = DistributionalLayout::default();
//! layout.prepare(&host);
//!
//! let key = ItemKey::new(0, 0);
//! let original = layout.frame_for_item(key).unwrap();
//! layout.report_preferred_size(key, original, Rect { width: 80.0, ..original });
//! layout.prepare(&host);
//!
//! assert_eq!(layout.distribution(), Some(Distribution::FillEqually));
//! assert_eq!(layout.content_size().width, 600.0);
//! ```
//!
//! # Modules
//!
//! - [`store`] - the single writer of per-item records
//! - [`cache`] - memoized aggregates keyed by the store version
//! - [`engine`] - distribution decision and placement sweep
//! - [`layout`] - host-facing protocol

pub mod attributes;
pub mod cache;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod host;
pub mod invalidation;
pub mod layout;
pub mod store;

pub use attributes::{ItemKey, ItemLayout, LayoutAttributes};
pub use cache::{CacheStats, LayoutCache};
pub use config::{LayoutConfig, LayoutConfigError};
pub use distribution::{Distribution, DistributionState};
pub use distrow_core::geometry::{Rect, Sides, Size};
pub use engine::{DistributionEngine, Remeasurement, preferred_distribution};
pub use host::{HostSnapshot, LayoutHost};
pub use invalidation::{InvalidationContext, InvalidationDelta, InvalidationFlags};
pub use layout::{DistributionObserver, DistributionalLayout, LayoutSnapshot, RecordSnapshot};
pub use store::AttributeStore;
