#![forbid(unsafe_code)]

//! Layout configuration and validation.
//!
//! ```
//! use distrow_layout::{LayoutConfig, Sides, Size};
//!
//! let config = LayoutConfig::default()
//!     .with_estimated_item_size(Size::new(120.0, 44.0))
//!     .with_section_inset(Sides::horizontal(16.0))
//!     .with_item_spacing(8.0);
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;

use distrow_core::geometry::{Sides, Size};
use serde::{Deserialize, Serialize};

/// Default placeholder size for items that have not measured themselves.
pub const DEFAULT_ESTIMATED_ITEM_SIZE: Size = Size::new(200.0, 200.0);

/// Default left/right section inset.
pub const DEFAULT_SECTION_INSET: Sides = Sides::new(0.0, 20.0, 0.0, 20.0);

/// Default gap between adjacent items of a section.
pub const DEFAULT_ITEM_SPACING: f64 = 10.0;

/// Tunables for a distributional layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Placeholder size handed out before an item reports its own size.
    pub estimated_item_size: Size,
    /// Insets applied to every section.
    pub section_inset: Sides,
    /// Horizontal gap between adjacent items within a section.
    pub item_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            estimated_item_size: DEFAULT_ESTIMATED_ITEM_SIZE,
            section_inset: DEFAULT_SECTION_INSET,
            item_spacing: DEFAULT_ITEM_SPACING,
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn with_estimated_item_size(mut self, size: Size) -> Self {
        self.estimated_item_size = size;
        self
    }

    #[must_use]
    pub fn with_section_inset(mut self, inset: Sides) -> Self {
        self.section_inset = inset;
        self
    }

    #[must_use]
    pub fn with_item_spacing(mut self, spacing: f64) -> Self {
        self.item_spacing = spacing;
        self
    }

    /// Reject values that would poison aggregate math.
    pub fn validate(&self) -> Result<(), LayoutConfigError> {
        let Size { width, height } = self.estimated_item_size;
        check_length("estimated_item_size.width", width)?;
        check_length("estimated_item_size.height", height)?;
        if width == 0.0 {
            return Err(LayoutConfigError::EmptyEstimate { width, height });
        }

        let inset = self.section_inset;
        check_length("section_inset.top", inset.top)?;
        check_length("section_inset.right", inset.right)?;
        check_length("section_inset.bottom", inset.bottom)?;
        check_length("section_inset.left", inset.left)?;

        check_length("item_spacing", self.item_spacing)
    }
}

fn check_length(field: &'static str, value: f64) -> Result<(), LayoutConfigError> {
    if !value.is_finite() {
        return Err(LayoutConfigError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(LayoutConfigError::NegativeValue { field, value });
    }
    Ok(())
}

/// Invalid [`LayoutConfig`] value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutConfigError {
    NonFiniteValue { field: &'static str },
    NegativeValue { field: &'static str, value: f64 },
    EmptyEstimate { width: f64, height: f64 },
}

impl fmt::Display for LayoutConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteValue { field } => write!(f, "{field} must be finite"),
            Self::NegativeValue { field, value } => {
                write!(f, "{field} must not be negative (got {value})")
            }
            Self::EmptyEstimate { width, height } => write!(
                f,
                "estimated item size {width}x{height} has zero width; estimates must be visible"
            ),
        }
    }
}

impl std::error::Error for LayoutConfigError {}
