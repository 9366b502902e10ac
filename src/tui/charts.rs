use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

use super::state::UiState;

/// How a sequence maps onto terminal columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarLayout {
    /// Number of rendered bars.
    pub columns: usize,
    /// Sequence entries folded into each bar.
    pub bucket: usize,
    pub bar_width: u16,
}

/// Fit `len` bars into `width` cells, widening bars when there is room and bucketing when there
/// is not. Bucketed bars show the largest value of their bucket.
pub fn layout_bars(len: usize, width: u16) -> BarLayout {
    let width = usize::from(width.max(1));
    if len == 0 {
        return BarLayout {
            columns: 0,
            bucket: 1,
            bar_width: 1,
        };
    }
    if len <= width {
        BarLayout {
            columns: len,
            bucket: 1,
            bar_width: u16::try_from(width / len).unwrap_or(u16::MAX).max(1),
        }
    } else {
        let bucket = len.div_ceil(width);
        BarLayout {
            columns: len.div_ceil(bucket),
            bucket,
            bar_width: 1,
        }
    }
}

/// Color for a bucket: any highlighted member wins, then all-sorted, then the default.
fn bucket_color(state: &UiState, start: usize, end: usize) -> Color {
    let mut all_sorted = true;
    for index in start..end {
        match state.bar_color(index) {
            Color::Green => {}
            Color::Cyan => all_sorted = false,
            highlighted => return highlighted,
        }
    }
    if all_sorted {
        Color::Green
    } else {
        Color::Cyan
    }
}

pub fn render_sequence(f: &mut Frame, area: Rect, state: &UiState) {
    let inner_width = area.width.saturating_sub(2);
    let layout = layout_bars(state.values.len(), inner_width);

    let mut bars: Vec<Bar> = Vec::with_capacity(layout.columns);
    for (i, chunk) in state.values.chunks(layout.bucket).enumerate() {
        let start = i * layout.bucket;
        let value = chunk.iter().copied().max().unwrap_or(0);
        let color = bucket_color(state, start, start + chunk.len());
        bars.push(
            Bar::default()
                .value(u64::from(value))
                .text_value(String::new())
                .style(Style::default().fg(color)),
        );
    }
    debug_assert_eq!(bars.len(), layout.columns);
    let max_value = state.values.iter().copied().max().unwrap_or(1).max(1);

    let mut title = vec![
        Span::raw(format!("{} ", state.settings.algorithm.title())),
        Span::styled(
            format!("[{}]", state.run_state),
            Style::default().fg(state_color(state)),
        ),
    ];
    if layout.bucket > 1 {
        title.push(Span::styled(
            format!(" {} values per bar", layout.bucket),
            Style::default().fg(Color::Gray),
        ));
    }

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Line::from(title)),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(layout.bar_width)
        .bar_gap(0)
        .max(u64::from(max_value));
    f.render_widget(chart, area);
}

pub fn state_color(state: &UiState) -> Color {
    use crate::model::RunState;
    match state.run_state {
        RunState::Idle => Color::Gray,
        RunState::Running if state.paused => Color::Yellow,
        RunState::Running => Color::Cyan,
        RunState::Cancelled => Color::Red,
        RunState::Completed => Color::Green,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_widen_to_fill() {
        assert_eq!(
            layout_bars(10, 100),
            BarLayout {
                columns: 10,
                bucket: 1,
                bar_width: 10
            }
        );
        assert_eq!(layout_bars(100, 100).bar_width, 1);
    }

    #[test]
    fn test_bars_bucket_when_too_many() {
        let l = layout_bars(500, 80);
        assert_eq!(l.bucket, 7);
        assert_eq!(l.columns, 72);
        assert!(l.columns <= 80);
        assert_eq!(l.bar_width, 1);
    }

    #[test]
    fn test_degenerate_sizes() {
        assert_eq!(layout_bars(0, 80).columns, 0);
        assert_eq!(layout_bars(5, 0).bucket, 5);
    }

    #[test]
    fn test_columns_match_rendered_buckets() {
        for len in [1, 5, 79, 80, 81, 159, 160, 161, 500] {
            let values = vec![1u32; len];
            let l = layout_bars(len, 80);
            assert_eq!(values.chunks(l.bucket).count(), l.columns, "len {len}");
            assert!(l.columns <= 80, "len {len}");
        }
    }

    #[test]
    fn test_bucket_color_prefers_highlight() {
        use crate::model::{SortEvent, StepEvent, StepKind};
        let mut s = UiState::default();
        s.apply_event(SortEvent::Reset {
            values: vec![4, 3, 2, 1],
            epoch: 1,
        });
        assert_eq!(bucket_color(&s, 0, 4), Color::Cyan);
        s.apply_event(SortEvent::Step(StepEvent {
            kind: StepKind::Compare,
            indices: vec![2, 3],
            values: vec![2, 1],
            epoch: 1,
            ordinal: 1,
        }));
        assert_eq!(bucket_color(&s, 0, 2), Color::Cyan);
        assert_eq!(bucket_color(&s, 2, 4), Color::Yellow);
    }
}
