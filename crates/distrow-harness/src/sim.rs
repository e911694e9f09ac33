#![forbid(unsafe_code)]

//! Simulated self-sizing host.
//!
//! [`Simulator`] drives a [`DistributionalLayout`] the way a scrolling
//! container would: prepare, walk the visible windows across the content,
//! ask every rendered item for its natural width, report the differing ones,
//! and repeat until a pass applies nothing.
//!
//! ```
//! use distrow_harness::scenario::{ScenarioConfig, WidthPattern};
//! use distrow_harness::sim::Simulator;
//! use distrow_harness::trace::Outcome;
//! use distrow_layout::Distribution;
//!
//! let scenario = ScenarioConfig::default()
//!     .with_shape(1, 2)
//!     .with_pattern(WidthPattern::Uniform { width: 80 });
//! let mut sim = Simulator::from_scenario(&scenario);
//! let report = sim.run_to_convergence();
//! assert_eq!(report.outcome, Outcome::Converged);
//! assert_eq!(report.distribution, Some(Distribution::FillEqually));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use distrow_layout::{
    Distribution, DistributionalLayout, ItemKey, LayoutHost, Rect, Sides, Size,
};

use crate::scenario::ScenarioConfig;
use crate::trace::{Outcome, TraceEvent, TraceLog};

/// Pass budget for [`Simulator::run_to_convergence`].
pub const DEFAULT_MAX_PASSES: usize = 8;

/// Host whose items know their natural widths.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedHost {
    /// Natural widths per section.
    pub widths: Vec<Vec<f64>>,
    pub bounds: Rect,
    pub safe_area: Sides,
}

impl SimulatedHost {
    pub fn new(widths: Vec<Vec<f64>>, bounds: Rect) -> Self {
        Self {
            widths,
            bounds,
            safe_area: Sides::ZERO,
        }
    }

    /// Natural width of `key`, if the host still has that item.
    pub fn natural_width(&self, key: ItemKey) -> Option<f64> {
        self.widths.get(key.section)?.get(key.row).copied()
    }

    pub fn counts(&self) -> Vec<usize> {
        self.widths.iter().map(Vec::len).collect()
    }
}

impl LayoutHost for SimulatedHost {
    fn section_count(&self) -> usize {
        self.widths.len()
    }

    fn item_count(&self, section: usize) -> usize {
        self.widths.get(section).map_or(0, Vec::len)
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn safe_area(&self) -> Sides {
        self.safe_area
    }
}

/// Summary of a simulated run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceReport {
    pub outcome: Outcome,
    pub passes: usize,
    pub reports: usize,
    pub distribution: Option<Distribution>,
    pub content_size: Size,
    pub notifications: Vec<Distribution>,
    pub checksum: String,
}

/// Drives a layout against a [`SimulatedHost`].
#[derive(Debug, Clone)]
pub struct Simulator {
    layout: DistributionalLayout,
    host: SimulatedHost,
    max_passes: usize,
    pass: usize,
    notifications: Vec<Distribution>,
    trace: TraceLog,
}

impl Simulator {
    pub fn new(layout: DistributionalLayout, host: SimulatedHost) -> Self {
        Self {
            layout,
            host,
            max_passes: DEFAULT_MAX_PASSES,
            pass: 0,
            notifications: Vec::new(),
            trace: TraceLog::new(true),
        }
    }

    /// Default layout over the widths `scenario` generates.
    pub fn from_scenario(scenario: &ScenarioConfig) -> Self {
        let bounds = Rect::from_size(scenario.viewport_width, scenario.viewport_height);
        let host = SimulatedHost::new(scenario.generate(), bounds);
        let mut sim = Self::new(DistributionalLayout::default(), host);
        sim.trace.record(TraceEvent::SimStart {
            case: scenario.case_name.clone(),
            seed: scenario.seed,
            pattern: scenario.pattern.name().to_string(),
            sections: sim.host.counts(),
            viewport_width: scenario.viewport_width,
            viewport_height: scenario.viewport_height,
        });
        sim
    }

    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace = TraceLog::new(enabled);
        self
    }

    pub fn layout(&self) -> &DistributionalLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut DistributionalLayout {
        &mut self.layout
    }

    pub fn host(&self) -> &SimulatedHost {
        &self.host
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    /// Run one prepare + measure pass. Returns the number of applied reports.
    pub fn run_pass(&mut self) -> usize {
        self.layout.prepare(&self.host);
        let content_width = self.layout.content_size().width;
        self.trace.record(TraceEvent::Prepare {
            pass: self.pass,
            state: self.layout.state(),
            content_width,
            items: self.layout.store().len(),
        });
        self.drain_notifications();

        let scroll = self.host.bounds.x;
        let mut applied = 0;
        let mut window = self.host.viewport_frame();
        window.x = 0.0;
        loop {
            applied += self.measure_window(window);
            window.x += window.width.max(1.0);
            let content_width = self.layout.content_size().width;
            if !content_width.is_finite() || window.x >= content_width {
                break;
            }
        }
        self.scroll_to(scroll);
        self.drain_notifications();

        self.pass += 1;
        applied
    }

    /// Repeat passes until one applies nothing or the budget runs out.
    pub fn run_to_convergence(&mut self) -> ConvergenceReport {
        let start_pass = self.pass;
        let mut reports = 0;
        let mut outcome = Outcome::Exhausted;
        while self.pass - start_pass < self.max_passes {
            let applied = self.run_pass();
            reports += applied;
            if applied == 0 {
                outcome = Outcome::Converged;
                break;
            }
        }

        let report = ConvergenceReport {
            outcome,
            passes: self.pass - start_pass,
            reports,
            distribution: self.layout.distribution(),
            content_size: self.layout.content_size(),
            notifications: std::mem::take(&mut self.notifications),
            checksum: self.checksum(),
        };
        distrow_core::info!(
            outcome = ?report.outcome,
            passes = report.passes,
            reports = report.reports,
            "simulation finished"
        );
        self.trace.record(TraceEvent::SimComplete {
            outcome: report.outcome,
            passes: report.passes,
            reports: report.reports,
            distribution: report.distribution,
            content_width: report.content_size.width,
            checksum: report.checksum.clone(),
        });
        report
    }

    /// Resize the host the way a window or split view would.
    pub fn resize(&mut self, width: f64, height: f64) {
        let new_bounds = Rect {
            width,
            height,
            ..self.host.bounds
        };
        let mut cleared = false;
        if self.layout.should_invalidate_for_bounds_change(new_bounds) {
            let context = self.layout.bounds_did_change(new_bounds);
            cleared = context.flags.resets_store();
        }
        self.host.bounds = new_bounds;
        self.trace.record(TraceEvent::BoundsChange {
            width,
            height,
            cleared,
        });
    }

    /// Replace the items and tell the layout the counts changed.
    pub fn replace_items(&mut self, widths: Vec<Vec<f64>>) {
        self.host.widths = widths;
        self.layout.invalidate_data_source_counts();
        self.trace.record(TraceEvent::DataSourceChange {
            sections: self.host.counts(),
        });
    }

    /// Change natural widths without touching the counts.
    pub fn set_natural_width(&mut self, key: ItemKey, width: f64) -> bool {
        match self
            .host
            .widths
            .get_mut(key.section)
            .and_then(|section| section.get_mut(key.row))
        {
            Some(slot) => {
                *slot = width;
                true
            }
            None => false,
        }
    }

    /// Hash of every placed frame, stable across runs.
    pub fn checksum(&self) -> String {
        let mut hasher = DefaultHasher::new();
        for (key, attrs) in self.layout.store().iter() {
            key.hash(&mut hasher);
            attrs.frame.x.to_bits().hash(&mut hasher);
            attrs.frame.width.to_bits().hash(&mut hasher);
        }
        format!("{:016x}", hasher.finish())
    }

    /// Scrolling keeps the width, so the layout keeps its records.
    fn scroll_to(&mut self, x: f64) {
        let bounds = Rect {
            x,
            ..self.host.bounds
        };
        if self.layout.should_invalidate_for_bounds_change(bounds) {
            self.layout.bounds_did_change(bounds);
        }
        self.host.bounds = bounds;
    }

    fn measure_window(&mut self, window: Rect) -> usize {
        self.scroll_to(window.x);
        let visible = self.layout.items_intersecting(window);
        let mut applied = 0;
        for item in visible {
            let Some(natural) = self.host.natural_width(item.key) else {
                continue;
            };
            // Frames move as earlier items in this window resize.
            let Some(original) = self.layout.frame_for_item(item.key) else {
                continue;
            };
            let preferred = Rect {
                width: natural,
                ..original
            };
            if let Some(context) = self.layout.report_preferred_size(item.key, original, preferred) {
                self.trace.record(TraceEvent::Report {
                    pass: self.pass,
                    key: item.key,
                    original_width: original.width,
                    preferred_width: natural,
                    width_delta: original.width - natural,
                    offset_adjustment: context.content_offset_adjustment,
                });
                applied += 1;
            }
        }
        applied
    }

    fn drain_notifications(&mut self) {
        for distribution in self.layout.take_notifications() {
            self.trace.record(TraceEvent::Notification {
                pass: self.pass,
                distribution,
            });
            self.notifications.push(distribution);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::WidthPattern;

    fn custom(widths: Vec<Vec<f64>>, viewport: f64) -> Simulator {
        let scenario = ScenarioConfig::default()
            .with_viewport(viewport, 44.0)
            .with_pattern(WidthPattern::Custom { sections: widths });
        Simulator::from_scenario(&scenario)
    }

    fn frames(sim: &Simulator) -> Vec<(f64, f64)> {
        sim.layout()
            .store()
            .iter()
            .map(|(_, attrs)| (attrs.frame.x, attrs.frame.width))
            .collect()
    }

    #[test]
    fn small_items_converge_to_fill_equally() {
        let mut sim = custom(vec![vec![80.0, 120.0]], 600.0);
        let report = sim.run_to_convergence();
        assert_eq!(report.outcome, Outcome::Converged);
        assert_eq!(report.passes, 2);
        assert_eq!(report.reports, 2);
        assert_eq!(report.distribution, Some(Distribution::FillEqually));
        assert_eq!(frames(&sim), [(20.0, 275.0), (305.0, 275.0)]);
        assert_eq!(
            report.notifications,
            [
                Distribution::FillEqually,
                Distribution::Fill,
                Distribution::FillEqually
            ]
        );
    }

    #[test]
    fn one_wide_item_converges_to_fill_proportionally() {
        let mut sim = custom(vec![vec![400.0, 100.0]], 600.0);
        let report = sim.run_to_convergence();
        assert_eq!(report.distribution, Some(Distribution::FillProportionally));
        assert_eq!(frames(&sim), [(20.0, 440.0), (470.0, 110.0)]);
        assert_eq!(report.content_size.width, 600.0);
    }

    #[test]
    fn overflowing_items_converge_to_fill() {
        let mut sim = custom(vec![vec![300.0, 250.0, 150.0]], 600.0);
        let report = sim.run_to_convergence();
        assert_eq!(report.outcome, Outcome::Converged);
        assert_eq!(report.distribution, Some(Distribution::Fill));
        assert_eq!(frames(&sim), [(20.0, 300.0), (330.0, 250.0), (590.0, 150.0)]);
        assert_eq!(report.content_size.width, 760.0);
    }

    #[test]
    fn width_resize_restarts_protocol() {
        let mut sim = custom(vec![vec![80.0, 120.0]], 600.0);
        sim.run_to_convergence();
        sim.resize(800.0, 44.0);
        assert!(sim.layout().store().is_empty());

        let report = sim.run_to_convergence();
        assert_eq!(report.distribution, Some(Distribution::FillEqually));
        assert_eq!(frames(&sim), [(20.0, 375.0), (405.0, 375.0)]);
    }

    #[test]
    fn height_resize_keeps_records() {
        let mut sim = custom(vec![vec![80.0, 120.0]], 600.0);
        sim.run_to_convergence();
        let before = sim.checksum();
        sim.resize(600.0, 88.0);
        assert_eq!(sim.layout().store().len(), 2);
        assert_eq!(sim.checksum(), before);
    }

    #[test]
    fn content_change_of_fill_item_is_remeasured() {
        let mut sim = custom(vec![vec![300.0, 250.0, 150.0]], 600.0);
        sim.run_to_convergence();
        assert!(sim.set_natural_width(ItemKey::new(0, 0), 260.0));
        let report = sim.run_to_convergence();
        assert_eq!(report.reports, 1);
        assert_eq!(frames(&sim), [(20.0, 260.0), (290.0, 250.0), (550.0, 150.0)]);
    }

    #[test]
    fn replacing_items_resets_layout() {
        let mut sim = custom(vec![vec![300.0, 250.0, 150.0]], 600.0);
        sim.run_to_convergence();
        sim.replace_items(vec![vec![50.0], vec![60.0]]);
        assert!(sim.layout().store().is_empty());
        let report = sim.run_to_convergence();
        assert_eq!(report.outcome, Outcome::Converged);
        assert_eq!(sim.layout().store().len(), 2);
        assert_eq!(report.distribution, Some(Distribution::FillEqually));
    }

    #[test]
    fn zero_pass_budget_is_exhausted() {
        let mut sim = custom(vec![vec![80.0]], 600.0).with_max_passes(0);
        let report = sim.run_to_convergence();
        assert_eq!(report.outcome, Outcome::Exhausted);
        assert_eq!(report.passes, 0);
    }

    #[test]
    fn trace_records_every_phase() {
        let mut sim = custom(vec![vec![80.0, 120.0]], 600.0);
        sim.run_to_convergence();
        let trace = sim.trace();
        assert_eq!(trace.count("sim_start"), 1);
        assert_eq!(trace.count("prepare"), 2);
        assert_eq!(trace.count("report"), 2);
        assert_eq!(trace.count("notification"), 3);
        assert_eq!(trace.count("sim_complete"), 1);
    }
}
