//! Post-run processing utilities.
//!
//! Turns a finished run into the summary handed to presentation layers.

use crate::model::{is_non_decreasing, Algorithm, RunState, RunStatistics, RunSummary, Value};

pub(crate) fn build_summary(
    algorithm: Algorithm,
    state: RunState,
    statistics: RunStatistics,
    speed: u8,
    initial: Vec<Value>,
    output: Vec<Value>,
    comments: Option<String>,
) -> RunSummary {
    let sorted = is_non_decreasing(&output);
    RunSummary {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        algorithm,
        state,
        statistics,
        array_size: output.len(),
        speed,
        initial,
        output,
        sorted,
        comments: comments.filter(|c| !c.trim().is_empty()),
    }
}
