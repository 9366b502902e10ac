use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const KEYBINDS: &[(&str, &str)] = &[
    ("s / Enter", "Start a run"),
    ("x / Esc", "Cancel the run"),
    ("p", "Pause/Resume"),
    ("n", "New random sequence"),
    ("+ / -", "Faster / slower"),
    ("] / [", "Grow / shrink the sequence by 5"),
    ("a / →", "Next algorithm"),
    ("←", "Previous algorithm"),
    ("tab", "Switch tabs"),
    ("?", "Show this help"),
    ("q / Ctrl-C", "Quit"),
];

pub fn draw_help(area: Rect, f: &mut Frame) {
    let mut lines = vec![Line::from("Keybinds:")];
    lines.extend(KEYBINDS.iter().map(|(keys, action)| {
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{keys:<12}"), Style::default().fg(Color::Magenta)),
            Span::raw(*action),
        ])
    }));
    lines.push(Line::from(""));
    lines.push(Line::from("Bars:"));
    for (color, meaning) in [
        (Color::Yellow, "compared"),
        (Color::Red, "swapped"),
        (Color::Magenta, "overwritten"),
        (Color::Green, "sorted"),
    ] {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled("██", Style::default().fg(color)),
            Span::raw(format!(" {meaning}")),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Size and sequence changes are rejected during a run."));
    lines.push(Line::from(
        "Algorithm changes apply at the next start; speed applies immediately.",
    ));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
