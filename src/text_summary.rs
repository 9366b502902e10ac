//! Text summary builder for CLI output.
//!
//! Formats a finished run into human-readable lines for text mode.

use crate::model::{RunState, RunSummary, Value};

/// Longest sequence printed in full; longer ones are elided in the middle.
const PREVIEW_LEN: usize = 24;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_text_summary(summary: &RunSummary) -> TextSummary {
    let mut lines = Vec::new();
    let stats = &summary.statistics;

    lines.push(format!(
        "{} ({} values, speed {}): {}",
        summary.algorithm.title(),
        summary.array_size,
        summary.speed,
        summary.state
    ));
    if let Some(comments) = summary.comments.as_deref() {
        lines.push(format!("Comments: {comments}"));
    }
    lines.push(format!(
        "Comparisons: {}  Exchanges: {}  Elapsed: {}",
        stats.comparisons,
        stats.exchanges,
        format_elapsed(stats.elapsed_ms)
    ));
    if stats.elapsed_ms > 0 {
        let secs = stats.elapsed_ms as f64 / 1000.0;
        lines.push(format!(
            "Rate: {:.1} comparisons/s, {:.1} exchanges/s",
            stats.comparisons as f64 / secs,
            stats.exchanges as f64 / secs
        ));
    }
    lines.push(format!("Input:  {}", preview(&summary.initial)));
    lines.push(format!("Output: {}", preview(&summary.output)));

    match (summary.state, summary.sorted) {
        (RunState::Completed, true) => {}
        (RunState::Completed, false) => {
            lines.push("Warning: output is not in non-decreasing order".into())
        }
        (_, _) => lines.push("Run did not complete; output is a partial ordering".into()),
    }

    TextSummary { lines }
}

pub(crate) fn format_elapsed(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms} ms")
    } else {
        format!("{:.2} s", ms as f64 / 1000.0)
    }
}

fn preview(values: &[Value]) -> String {
    let join = |vs: &[Value]| {
        vs.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    };
    if values.len() <= PREVIEW_LEN {
        return format!("[{}]", join(values));
    }
    let half = PREVIEW_LEN / 2;
    format!(
        "[{} ... {}] ({} values)",
        join(&values[..half]),
        join(&values[values.len() - half..]),
        values.len()
    )
}
