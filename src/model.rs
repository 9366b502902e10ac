use crate::engine::SortError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Element type of the sequence being sorted.
pub type Value = u32;

pub const MIN_ARRAY_SIZE: usize = 5;
pub const MAX_ARRAY_SIZE: usize = 500;
pub const MIN_SPEED: u8 = 1;
pub const MAX_SPEED: u8 = 10;

/// Random values are drawn from this half-open range (bar heights).
pub const VALUE_RANGE: std::ops::Range<Value> = 10..360;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    pub algorithm: Algorithm,
    pub array_size: usize,
    pub speed: u8,
    #[serde(default)]
    pub values: Option<Vec<Value>>,
    #[serde(default)]
    pub seed: Option<u64>,
    pub pacing: Pacing,
    #[serde(default)]
    pub comments: Option<String>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Bubble,
            array_size: 50,
            speed: 5,
            values: None,
            seed: None,
            pacing: Pacing::default(),
            comments: None,
        }
    }
}

/// Step timings. The per-step pause shrinks as speed grows and never drops below `floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pacing {
    #[serde(with = "humantime_serde")]
    pub base: Duration,
    #[serde(with = "humantime_serde")]
    pub step: Duration,
    #[serde(with = "humantime_serde")]
    pub floor: Duration,
    /// Fixed pause between indices of the completion sweep.
    #[serde(with = "humantime_serde")]
    pub sweep: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(220),
            step: Duration::from_millis(20),
            floor: Duration::ZERO,
            sweep: Duration::from_millis(20),
        }
    }
}

impl Pacing {
    /// No pauses at all; steps still yield to the scheduler.
    pub fn instant() -> Self {
        Self {
            base: Duration::ZERO,
            step: Duration::ZERO,
            floor: Duration::ZERO,
            sweep: Duration::ZERO,
        }
    }

    pub fn pause_for(&self, speed: u8) -> Duration {
        let reduction = self.step.saturating_mul(u32::from(speed));
        self.base.saturating_sub(reduction).max(self.floor)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Bubble,
    Selection,
    Insertion,
    Merge,
    Quick,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Bubble,
        Algorithm::Selection,
        Algorithm::Insertion,
        Algorithm::Merge,
        Algorithm::Quick,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Bubble => "bubble",
            Algorithm::Selection => "selection",
            Algorithm::Insertion => "insertion",
            Algorithm::Merge => "merge",
            Algorithm::Quick => "quick",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Algorithm::Bubble => "Bubble Sort",
            Algorithm::Selection => "Selection Sort",
            Algorithm::Insertion => "Insertion Sort",
            Algorithm::Merge => "Merge Sort",
            Algorithm::Quick => "Quick Sort",
        }
    }

    /// Next algorithm in the enumerated order, wrapping around.
    pub fn cycle(self, forward: bool) -> Self {
        let idx = Self::ALL.iter().position(|a| *a == self).unwrap_or(0);
        let len = Self::ALL.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        Self::ALL[next]
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| SortError::InvalidArgument(format!("unknown algorithm: {s:?}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Cancelled,
    Completed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Cancelled => "cancelled",
            RunState::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub comparisons: u64,
    pub exchanges: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    Compare,
    Swap,
    Overwrite,
    /// Completion sweep marker; never counted.
    Sorted,
}

/// One observable unit of algorithmic work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    pub kind: StepKind,
    pub indices: Vec<usize>,
    /// Values at `indices` after the step was applied.
    pub values: Vec<Value>,
    /// Sequence snapshot this step belongs to.
    pub epoch: u64,
    /// 1-based position of the step within its run.
    pub ordinal: u64,
}

/// Controller settings echoed to presentation layers whenever they change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub algorithm: Algorithm,
    pub array_size: usize,
    pub speed: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SortEvent {
    /// Full redraw: the whole sequence changed.
    Reset {
        values: Vec<Value>,
        epoch: u64,
    },
    Step(StepEvent),
    Statistics(RunStatistics),
    RunStateChanged(RunState),
    Settings(Settings),
    Info(InfoEvent),
    RunCompleted {
        // Boxed to keep the hot-path Step variant small.
        summary: Box<RunSummary>,
    },
}

/// Structured info events emitted by the controller and consumed by UI/CLI layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InfoEvent {
    Message(String),
    Rejected { command: String, reason: String },
    Cancelling,
    Paused(bool),
    SequenceGenerated { size: usize },
}

impl InfoEvent {
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Rejected { command, reason } => format!("{command} rejected: {reason}"),
            InfoEvent::Cancelling => "Cancelling…".to_string(),
            InfoEvent::Paused(true) => "Paused".to_string(),
            InfoEvent::Paused(false) => "Resumed".to_string(),
            InfoEvent::SequenceGenerated { size } => format!("New sequence of {size} values"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default)]
    pub timestamp_utc: String,
    pub algorithm: Algorithm,
    pub state: RunState,
    pub statistics: RunStatistics,
    pub array_size: usize,
    pub speed: u8,
    pub initial: Vec<Value>,
    pub output: Vec<Value>,
    pub sorted: bool,
    #[serde(default)]
    pub comments: Option<String>,
}

pub fn is_non_decreasing(values: &[Value]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_shrinks_with_speed() {
        let pacing = Pacing::default();
        assert_eq!(pacing.pause_for(1), Duration::from_millis(200));
        assert_eq!(pacing.pause_for(10), Duration::from_millis(20));
        for speed in MIN_SPEED..MAX_SPEED {
            assert!(pacing.pause_for(speed) >= pacing.pause_for(speed + 1));
        }
    }

    #[test]
    fn pause_never_drops_below_floor() {
        let pacing = Pacing {
            base: Duration::from_millis(50),
            step: Duration::from_millis(20),
            floor: Duration::from_millis(5),
            sweep: Duration::ZERO,
        };
        assert_eq!(pacing.pause_for(2), Duration::from_millis(10));
        assert_eq!(pacing.pause_for(3), Duration::from_millis(5));
        assert_eq!(pacing.pause_for(10), Duration::from_millis(5));
    }

    #[test]
    fn algorithm_names_parse() {
        for a in Algorithm::ALL {
            assert_eq!(a.name().parse::<Algorithm>().unwrap(), a);
        }
        assert!(matches!(
            "heap".parse::<Algorithm>(),
            Err(SortError::InvalidArgument(_))
        ));
        assert!("Bubble".parse::<Algorithm>().is_err());
    }

    #[test]
    fn algorithm_cycle_wraps() {
        assert_eq!(Algorithm::Quick.cycle(true), Algorithm::Bubble);
        assert_eq!(Algorithm::Bubble.cycle(false), Algorithm::Quick);
        assert_eq!(Algorithm::Merge.cycle(false), Algorithm::Insertion);
    }

    #[test]
    fn summary_serializes_lowercase_algorithm() {
        let summary = RunSummary {
            timestamp_utc: String::new(),
            algorithm: Algorithm::Merge,
            state: RunState::Completed,
            statistics: RunStatistics::default(),
            array_size: 2,
            speed: 5,
            initial: vec![2, 1],
            output: vec![1, 2],
            sorted: true,
            comments: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["algorithm"], "merge");
        assert_eq!(json["state"], "Completed");
    }
}
