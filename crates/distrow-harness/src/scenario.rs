#![forbid(unsafe_code)]

//! Deterministic item-width scenarios.
//!
//! A scenario is the set of natural widths the simulated items report once
//! they are asked to measure themselves. The same seed always produces the
//! same widths.
//!
//! ```
//! use distrow_harness::scenario::{ScenarioConfig, WidthPattern};
//!
//! let config = ScenarioConfig::default()
//!     .with_seed(7)
//!     .with_shape(2, 3)
//!     .with_pattern(WidthPattern::Mixed { min: 40, max: 120 });
//! let widths = config.generate();
//! assert_eq!(widths.len(), 2);
//! assert!(widths.iter().flatten().all(|w| (40.0..120.0).contains(w)));
//! ```

use serde::{Deserialize, Serialize};

/// How natural widths are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum WidthPattern {
    /// Every item has the same width.
    Uniform { width: u32 },
    /// Widths drawn from `[min, max)`.
    Mixed { min: u32, max: u32 },
    /// Mostly narrow items with one dominant item per section.
    Dominant { narrow: u32, wide: u32 },
    /// Explicit widths per section.
    Custom { sections: Vec<Vec<f64>> },
}

impl WidthPattern {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform { .. } => "uniform",
            Self::Mixed { .. } => "mixed",
            Self::Dominant { .. } => "dominant",
            Self::Custom { .. } => "custom",
        }
    }
}

impl Default for WidthPattern {
    fn default() -> Self {
        Self::Mixed { min: 40, max: 160 }
    }
}

/// Scenario parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub seed: u64,
    pub pattern: WidthPattern,
    pub sections: usize,
    pub items_per_section: usize,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub case_name: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            pattern: WidthPattern::default(),
            sections: 1,
            items_per_section: 4,
            viewport_width: 600.0,
            viewport_height: 44.0,
            case_name: "default".into(),
        }
    }
}

impl ScenarioConfig {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: WidthPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Number of sections and items per section. Ignored by
    /// [`WidthPattern::Custom`].
    #[must_use]
    pub fn with_shape(mut self, sections: usize, items_per_section: usize) -> Self {
        self.sections = sections;
        self.items_per_section = items_per_section;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    #[must_use]
    pub fn with_case_name(mut self, name: impl Into<String>) -> Self {
        self.case_name = name.into();
        self
    }

    /// Natural widths per section.
    pub fn generate(&self) -> Vec<Vec<f64>> {
        let mut rng = SeededRng::new(self.seed);
        if let WidthPattern::Custom { sections } = &self.pattern {
            return sections.clone();
        }
        (0..self.sections)
            .map(|_| {
                let dominant = rng.next_range(0, self.items_per_section as u64) as usize;
                (0..self.items_per_section)
                    .map(|row| self.draw(&mut rng, row == dominant))
                    .collect()
            })
            .collect()
    }

    fn draw(&self, rng: &mut SeededRng, dominant: bool) -> f64 {
        let width = match self.pattern {
            WidthPattern::Uniform { width } => u64::from(width),
            WidthPattern::Mixed { min, max } => rng.next_range(u64::from(min), u64::from(max)),
            WidthPattern::Dominant { narrow, wide } => {
                if dominant {
                    u64::from(wide)
                } else {
                    u64::from(narrow)
                }
            }
            WidthPattern::Custom { .. } => 0,
        };
        width as f64
    }
}

/// LCG PRNG for reproducible scenarios.
#[derive(Debug, Clone)]
pub(crate) struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Value in `[min, max)`; `min` when the range is empty.
    pub(crate) fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }
}
