#![forbid(unsafe_code)]

//! JSONL trace of a simulated self-sizing run.
//!
//! # JSONL Schema
//!
//! ```json
//! {"event":"sim_start","case":"mixed_2x4","seed":7,"pattern":"mixed","sections":[4,4],"viewport_width":600.0,"viewport_height":44.0}
//! {"event":"prepare","pass":0,"state":{"state":"decided","distribution":"fill"},"content_width":1710.0,"items":8}
//! {"event":"report","pass":0,"key":{"section":0,"row":1},"original_width":200.0,"preferred_width":88.0,"width_delta":112.0,"offset_adjustment":0.0}
//! {"event":"notification","pass":0,"distribution":"fillEqually"}
//! {"event":"bounds_change","width":800.0,"height":44.0,"cleared":true}
//! {"event":"data_source_change","sections":[3]}
//! {"event":"sim_complete","outcome":"converged","passes":2,"reports":8,"distribution":"fill","content_width":740.0,"checksum":"..."}
//! ```

use std::io::{self, Write};

use distrow_layout::{Distribution, DistributionState, ItemKey};
use serde::{Deserialize, Serialize};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A pass applied no preferred sizes.
    Converged,
    /// The pass budget ran out first.
    Exhausted,
}

/// One trace line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    SimStart {
        case: String,
        seed: u64,
        pattern: String,
        sections: Vec<usize>,
        viewport_width: f64,
        viewport_height: f64,
    },
    Prepare {
        pass: usize,
        state: DistributionState,
        content_width: f64,
        items: usize,
    },
    Report {
        pass: usize,
        key: ItemKey,
        original_width: f64,
        preferred_width: f64,
        width_delta: f64,
        offset_adjustment: f64,
    },
    Notification {
        pass: usize,
        distribution: Distribution,
    },
    BoundsChange {
        width: f64,
        height: f64,
        cleared: bool,
    },
    DataSourceChange {
        sections: Vec<usize>,
    },
    SimComplete {
        outcome: Outcome,
        passes: usize,
        reports: usize,
        distribution: Option<Distribution>,
        content_width: f64,
        checksum: String,
    },
}

impl TraceEvent {
    /// The `event` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SimStart { .. } => "sim_start",
            Self::Prepare { .. } => "prepare",
            Self::Report { .. } => "report",
            Self::Notification { .. } => "notification",
            Self::BoundsChange { .. } => "bounds_change",
            Self::DataSourceChange { .. } => "data_source_change",
            Self::SimComplete { .. } => "sim_complete",
        }
    }
}

/// In-memory trace, optionally disabled.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    enabled: bool,
    events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, event: TraceEvent) {
        if self.enabled {
            self.events.push(event);
        }
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Events with the given `event` tag.
    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|event| event.name() == name).count()
    }

    /// Write one JSON object per line.
    pub fn write_jsonl<W: Write>(&self, mut out: W) -> io::Result<()> {
        for event in &self.events {
            serde_json::to_writer(&mut out, event)?;
            out.write_all(b"\n")?;
        }
        out.flush()
    }

    pub fn to_jsonl(&self) -> io::Result<String> {
        let mut buf = Vec::new();
        self.write_jsonl(&mut buf)?;
        String::from_utf8(buf).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    /// Parse a trace previously produced by [`Self::write_jsonl`].
    pub fn parse_jsonl(input: &str) -> Result<Vec<TraceEvent>, serde_json::Error> {
        input
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_log_records_nothing() {
        let mut log = TraceLog::new(false);
        log.record(TraceEvent::DataSourceChange { sections: vec![1] });
        assert!(log.events().is_empty());
        assert_eq!(log.to_jsonl().unwrap(), "");
    }

    #[test]
    fn lines_carry_event_tag() {
        let mut log = TraceLog::new(true);
        log.record(TraceEvent::Notification {
            pass: 1,
            distribution: Distribution::FillEqually,
        });
        log.record(TraceEvent::BoundsChange {
            width: 800.0,
            height: 44.0,
            cleared: true,
        });
        let jsonl = log.to_jsonl().unwrap();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(r#"{"event":"notification","pass":1,"distribution":"fillEqually""#));
        assert!(lines[1].contains(r#""event":"bounds_change""#));
        assert_eq!(log.count("notification"), 1);
    }

    #[test]
    fn parse_reads_back_written_trace() {
        let mut log = TraceLog::new(true);
        log.record(TraceEvent::Report {
            pass: 0,
            key: ItemKey::new(0, 1),
            original_width: 200.0,
            preferred_width: 88.0,
            width_delta: 112.0,
            offset_adjustment: 0.0,
        });
        log.record(TraceEvent::SimComplete {
            outcome: Outcome::Converged,
            passes: 2,
            reports: 1,
            distribution: None,
            content_width: 128.0,
            checksum: "00".into(),
        });
        let parsed = TraceLog::parse_jsonl(&log.to_jsonl().unwrap()).unwrap();
        assert_eq!(parsed, log.events());
    }
}
