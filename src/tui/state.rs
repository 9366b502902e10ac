use crate::model::{
    Algorithm, RunState, RunStatistics, RunSummary, Settings, SortEvent, StepKind, Value,
};
use ratatui::style::Color;

/// Last non-sweep step, kept so its bars can be highlighted until the next one arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub kind: StepKind,
    pub indices: Vec<usize>,
}

/// Renderer-side mirror of the sequence, rebuilt purely from events.
pub struct UiState {
    pub tab: usize,
    pub paused: bool,
    pub info: String,
    pub comments: Option<String>,

    pub values: Vec<Value>,
    pub epoch: u64,
    pub highlight: Option<Highlight>,
    pub sorted: Vec<bool>,
    pub steps_seen: u64,

    pub statistics: RunStatistics,
    pub run_state: RunState,
    pub settings: Settings,
    pub last_summary: Option<RunSummary>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            tab: 0,
            paused: false,
            info: String::new(),
            comments: None,
            values: Vec::new(),
            epoch: 0,
            highlight: None,
            sorted: Vec::new(),
            steps_seen: 0,
            statistics: RunStatistics::default(),
            run_state: RunState::Idle,
            settings: Settings {
                algorithm: Algorithm::Bubble,
                array_size: 0,
                speed: 5,
            },
            last_summary: None,
        }
    }
}

impl UiState {
    pub fn apply_event(&mut self, ev: SortEvent) {
        match ev {
            SortEvent::Reset { values, epoch } => {
                self.sorted = vec![false; values.len()];
                self.values = values;
                self.epoch = epoch;
                self.highlight = None;
                self.steps_seen = 0;
            }
            SortEvent::Step(step) => {
                // Steps from a replaced sequence would paint the wrong bars.
                if step.epoch != self.epoch {
                    return;
                }
                for (&index, &value) in step.indices.iter().zip(&step.values) {
                    if let Some(slot) = self.values.get_mut(index) {
                        *slot = value;
                    }
                }
                self.steps_seen = step.ordinal;
                if step.kind == StepKind::Sorted {
                    for &index in &step.indices {
                        if let Some(mark) = self.sorted.get_mut(index) {
                            *mark = true;
                        }
                    }
                    self.highlight = None;
                } else {
                    self.highlight = Some(Highlight {
                        kind: step.kind,
                        indices: step.indices,
                    });
                }
            }
            SortEvent::Statistics(stats) => self.statistics = stats,
            SortEvent::RunStateChanged(state) => {
                self.run_state = state;
                match state {
                    RunState::Running => {
                        self.paused = false;
                        self.info = format!("Running {}", self.settings.algorithm.title());
                    }
                    RunState::Cancelled | RunState::Completed | RunState::Idle => {
                        self.paused = false;
                        self.highlight = None;
                    }
                }
            }
            SortEvent::Settings(settings) => self.settings = settings,
            SortEvent::Info(info) => {
                if let crate::model::InfoEvent::Paused(p) = info {
                    self.paused = p;
                }
                self.info = info.to_message();
            }
            SortEvent::RunCompleted { summary } => {
                self.info = format!(
                    "{} {}: {} comparisons, {} exchanges",
                    summary.algorithm.title(),
                    summary.state,
                    summary.statistics.comparisons,
                    summary.statistics.exchanges
                );
                self.last_summary = Some(*summary);
            }
        }
    }

    /// Recap of the most recent finished run. Survives later `info` messages.
    pub fn last_run_line(&self) -> Option<String> {
        self.last_summary.as_ref().map(|summary| {
            let mut line = format!(
                "{} {} in {} ({} comparisons, {} exchanges)",
                summary.algorithm.title(),
                summary.state,
                crate::text_summary::format_elapsed(summary.statistics.elapsed_ms),
                summary.statistics.comparisons,
                summary.statistics.exchanges
            );
            if summary.state == RunState::Completed && !summary.sorted {
                line.push_str(", output unsorted");
            }
            line
        })
    }

    /// Bar color by priority: active step, then sweep mark, then default.
    pub fn bar_color(&self, index: usize) -> Color {
        if let Some(h) = &self.highlight {
            if h.indices.contains(&index) {
                return match h.kind {
                    StepKind::Compare => Color::Yellow,
                    StepKind::Swap => Color::Red,
                    StepKind::Overwrite => Color::Magenta,
                    StepKind::Sorted => Color::Green,
                };
            }
        }
        if self.sorted.get(index).copied().unwrap_or(false) {
            Color::Green
        } else {
            Color::Cyan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StepEvent;

    fn step(kind: StepKind, indices: Vec<usize>, values: Vec<Value>, epoch: u64) -> SortEvent {
        SortEvent::Step(StepEvent {
            kind,
            indices,
            values,
            epoch,
            ordinal: 1,
        })
    }

    #[test]
    fn test_steps_update_the_mirror() {
        let mut s = UiState::default();
        s.apply_event(SortEvent::Reset {
            values: vec![3, 1, 2],
            epoch: 2,
        });
        s.apply_event(step(StepKind::Swap, vec![0, 1], vec![1, 3], 2));
        assert_eq!(s.values, vec![1, 3, 2]);
        assert_eq!(s.bar_color(0), Color::Red);
        assert_eq!(s.bar_color(2), Color::Cyan);

        s.apply_event(step(StepKind::Sorted, vec![0], vec![1], 2));
        assert!(s.highlight.is_none());
        assert_eq!(s.bar_color(0), Color::Green);
    }

    #[test]
    fn test_stale_epoch_steps_are_ignored() {
        let mut s = UiState::default();
        s.apply_event(SortEvent::Reset {
            values: vec![3, 1, 2],
            epoch: 5,
        });
        s.apply_event(step(StepKind::Overwrite, vec![0], vec![99], 4));
        assert_eq!(s.values, vec![3, 1, 2]);
        assert!(s.highlight.is_none());
    }

    #[test]
    fn test_out_of_range_indices_do_not_panic() {
        let mut s = UiState::default();
        s.apply_event(SortEvent::Reset {
            values: vec![1],
            epoch: 1,
        });
        s.apply_event(step(StepKind::Overwrite, vec![7], vec![2], 1));
        assert_eq!(s.values, vec![1]);
    }

    #[test]
    fn test_pause_info_tracks_paused_flag() {
        let mut s = UiState::default();
        s.apply_event(SortEvent::Info(crate::model::InfoEvent::Paused(true)));
        assert!(s.paused);
        assert_eq!(s.info, "Paused");
        s.apply_event(SortEvent::RunStateChanged(RunState::Cancelled));
        assert!(!s.paused);
    }

    #[test]
    fn test_last_run_outlives_later_info() {
        let mut s = UiState::default();
        assert_eq!(s.last_run_line(), None);
        s.apply_event(SortEvent::RunCompleted {
            summary: Box::new(RunSummary {
                timestamp_utc: String::new(),
                algorithm: Algorithm::Merge,
                state: RunState::Cancelled,
                statistics: RunStatistics {
                    comparisons: 12,
                    exchanges: 0,
                    elapsed_ms: 340,
                },
                array_size: 8,
                speed: 5,
                initial: vec![8, 7, 6, 5, 4, 3, 2, 1],
                output: vec![7, 8, 5, 6, 4, 3, 2, 1],
                sorted: false,
                comments: None,
            }),
        });
        s.apply_event(SortEvent::Info(crate::model::InfoEvent::SequenceGenerated {
            size: 8,
        }));
        assert!(!s.info.contains("Merge"));
        let line = s.last_run_line().unwrap();
        assert!(line.starts_with(Algorithm::Merge.title()), "{line}");
        assert!(line.contains("cancelled in 340 ms"), "{line}");
        assert!(line.contains("12 comparisons"), "{line}");
    }
}
