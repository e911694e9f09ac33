#![forbid(unsafe_code)]

//! Deterministic simulation harness for distrow layouts.
//!
//! - **Scenarios**: seeded natural-width generators ([`scenario`]).
//! - **Simulation**: a host that runs the self-sizing protocol to a fixed
//!   point, including resizes and item replacement ([`sim`]).
//! - **Tracing**: a JSONL log of every prepare, report, and notification,
//!   with a frame checksum for regression comparison ([`trace`]).
//!
//! # Quick Start
//!
//! ```
//! use distrow_harness::run_scenario;
//! use distrow_harness::scenario::ScenarioConfig;
//!
//! let (report, trace) = run_scenario(&ScenarioConfig::default().with_seed(3));
//! assert!(report.passes >= 1);
//! assert_eq!(trace.count("sim_complete"), 1);
//! ```

pub mod scenario;
pub mod sim;
pub mod trace;

pub use scenario::{ScenarioConfig, WidthPattern};
pub use sim::{ConvergenceReport, SimulatedHost, Simulator};
pub use trace::{Outcome, TraceEvent, TraceLog};

/// Run `scenario` to convergence and return the summary and trace.
pub fn run_scenario(scenario: &ScenarioConfig) -> (ConvergenceReport, TraceLog) {
    let mut sim = Simulator::from_scenario(scenario);
    let report = sim.run_to_convergence();
    (report, sim.trace().clone())
}
