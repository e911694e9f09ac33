#![forbid(unsafe_code)]

//! Horizontal distribution strategies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How item widths are derived from intrinsic widths and the viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Distribution {
    /// Natural (intrinsic) widths; the row may overflow and scroll.
    Fill,
    /// Every item gets the same width and the row spans the viewport.
    FillEqually,
    /// Widths scale with intrinsic widths so the row spans the viewport.
    FillProportionally,
}

impl Distribution {
    /// All strategies in declaration order.
    pub const ALL: [Distribution; 3] = [
        Distribution::Fill,
        Distribution::FillEqually,
        Distribution::FillProportionally,
    ];

    /// Stable identifier used in logs and snapshots.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Distribution::Fill => "fill",
            Distribution::FillEqually => "fillEqually",
            Distribution::FillProportionally => "fillProportionally",
        }
    }

    /// Whether widths are derived from the viewport rather than from content.
    #[must_use]
    pub const fn spans_viewport(self) -> bool {
        !matches!(self, Distribution::Fill)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout-instance distribution state.
///
/// `Unset` means no decision has been made yet: the layout is still seeding
/// estimates and waiting for items to measure themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "distribution")]
pub enum DistributionState {
    #[default]
    Unset,
    Decided(Distribution),
}

impl DistributionState {
    /// The decided distribution, if any.
    #[must_use]
    pub const fn distribution(self) -> Option<Distribution> {
        match self {
            DistributionState::Unset => None,
            DistributionState::Decided(distribution) => Some(distribution),
        }
    }

    #[must_use]
    pub const fn is_unset(self) -> bool {
        matches!(self, DistributionState::Unset)
    }
}

impl From<Distribution> for DistributionState {
    fn from(distribution: Distribution) -> Self {
        DistributionState::Decided(distribution)
    }
}

impl fmt::Display for DistributionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionState::Unset => f.write_str("unset"),
            DistributionState::Decided(distribution) => distribution.fmt(f),
        }
    }
}
