#![forbid(unsafe_code)]

//! Scenario runner.
//!
//! Runs one seeded scenario through the simulated host and writes the JSONL
//! trace to stdout. The summary goes to stderr.
//!
//! # Running
//!
//! ```sh
//! cargo run -p distrow-harness -- --seed=7 --pattern=mixed --sections=2 --items=6
//! ```

use std::env;
use std::io;
use std::process::ExitCode;

use distrow_harness::scenario::{ScenarioConfig, WidthPattern};
use distrow_harness::sim::Simulator;
use distrow_harness::trace::Outcome;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
distrow scenario runner

USAGE:
    distrow-harness [OPTIONS]

OPTIONS:
    --seed=N            RNG seed (default: 0)
    --pattern=NAME      uniform | mixed | dominant (default: mixed)
    --sections=N        Number of sections (default: 1)
    --items=N           Items per section (default: 4)
    --width=W           Viewport width (default: 600)
    --height=H          Viewport height (default: 44)
    --case=NAME         Case name recorded in the trace
    --max-passes=N      Pass budget (default: 8)
    --help, -h          Show this help message
    --version, -V       Show version

ENVIRONMENT VARIABLES:
    DISTROW_SEED        Override --seed default
    RUST_LOG            Log filter when built with tracing-json";

#[derive(Debug)]
struct Opts {
    scenario: ScenarioConfig,
    max_passes: usize,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            scenario: ScenarioConfig::default(),
            max_passes: distrow_harness::sim::DEFAULT_MAX_PASSES,
        }
    }
}

enum Parsed {
    Run(Opts),
    Exit(ExitCode),
}

fn parse_value<T: std::str::FromStr>(flag: &str, val: &str) -> Result<T, String> {
    val.parse()
        .map_err(|_| format!("Invalid {flag} value: {val}"))
}

fn parse_pattern(val: &str) -> Result<WidthPattern, String> {
    match val {
        "uniform" => Ok(WidthPattern::Uniform { width: 120 }),
        "mixed" => Ok(WidthPattern::default()),
        "dominant" => Ok(WidthPattern::Dominant {
            narrow: 60,
            wide: 320,
        }),
        other => Err(format!("Unknown --pattern value: {other}")),
    }
}

fn parse_args(args: &[String]) -> Result<Parsed, String> {
    let mut opts = Opts::default();
    if let Ok(val) = env::var("DISTROW_SEED")
        && let Ok(seed) = val.parse()
    {
        opts.scenario.seed = seed;
    }

    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("{HELP_TEXT}");
                return Ok(Parsed::Exit(ExitCode::SUCCESS));
            }
            "--version" | "-V" => {
                println!("distrow-harness {VERSION}");
                return Ok(Parsed::Exit(ExitCode::SUCCESS));
            }
            other => {
                let scenario = &mut opts.scenario;
                if let Some(val) = other.strip_prefix("--seed=") {
                    scenario.seed = parse_value("--seed", val)?;
                } else if let Some(val) = other.strip_prefix("--pattern=") {
                    scenario.pattern = parse_pattern(val)?;
                } else if let Some(val) = other.strip_prefix("--sections=") {
                    scenario.sections = parse_value("--sections", val)?;
                } else if let Some(val) = other.strip_prefix("--items=") {
                    scenario.items_per_section = parse_value("--items", val)?;
                } else if let Some(val) = other.strip_prefix("--width=") {
                    scenario.viewport_width = parse_value("--width", val)?;
                } else if let Some(val) = other.strip_prefix("--height=") {
                    scenario.viewport_height = parse_value("--height", val)?;
                } else if let Some(val) = other.strip_prefix("--case=") {
                    scenario.case_name = val.to_string();
                } else if let Some(val) = other.strip_prefix("--max-passes=") {
                    opts.max_passes = parse_value("--max-passes", val)?;
                } else {
                    return Err(format!(
                        "Unknown argument: {other}\nRun with --help for usage information."
                    ));
                }
            }
        }
    }
    Ok(Parsed::Run(opts))
}

fn main() -> ExitCode {
    #[cfg(feature = "tracing-json")]
    distrow_core::logging::init_json_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match parse_args(&args) {
        Ok(Parsed::Run(opts)) => opts,
        Ok(Parsed::Exit(code)) => return code,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let mut sim = Simulator::from_scenario(&opts.scenario).with_max_passes(opts.max_passes);
    let report = sim.run_to_convergence();

    if let Err(err) = sim.trace().write_jsonl(io::stdout().lock()) {
        eprintln!("failed to write trace: {err}");
        return ExitCode::FAILURE;
    }

    let distribution = report
        .distribution
        .map_or("unset", |distribution| distribution.as_str());
    eprintln!(
        "{:?}: {} passes, {} reports, {distribution}, content width {}, checksum {}",
        report.outcome, report.passes, report.reports, report.content_size.width, report.checksum
    );

    match report.outcome {
        Outcome::Converged => ExitCode::SUCCESS,
        Outcome::Exhausted => ExitCode::FAILURE,
    }
}
