mod charts;
mod help;
mod state;

use crate::cli::Cli;
use crate::model::{SortConfig, SortEvent, MAX_ARRAY_SIZE, MAX_SPEED, MIN_ARRAY_SIZE, MIN_SPEED};
use crate::orchestrator::{self, RunController, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Step applied by the resize keys.
const RESIZE_STEP: usize = 5;

pub async fn run(args: Cli, cfg: SortConfig) -> Result<()> {
    // Unbounded channels avoid backpressure and task switching in the hot path.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SortEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let controller =
        RunController::new(&cfg, event_tx.clone()).context("failed to prepare sequence")?;

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res =
        orchestrator::run_controller(controller, event_tx, cmd_rx, args.start_on_launch).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<SortEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        comments: args.comments.clone(),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(33);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive; unbounded channel avoids backpressure.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match key_command(&state, k.modifiers, k.code) {
                    KeyAction::Command(UiCommand::Quit) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    KeyAction::Command(cmd) => {
                        let _ = cmd_tx.send(cmd);
                    }
                    KeyAction::SwitchTab => state.tab = (state.tab + 1) % 2,
                    KeyAction::ShowHelp => state.tab = 1,
                    KeyAction::Ignore => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

#[derive(Debug)]
enum KeyAction {
    Command(UiCommand),
    SwitchTab,
    ShowHelp,
    Ignore,
}

/// Map a key press to an action. Bounds are clamped here so a held key does not spam rejections;
/// the controller still validates everything it receives.
fn key_command(state: &UiState, modifiers: KeyModifiers, code: KeyCode) -> KeyAction {
    let settings = state.settings;
    match (modifiers, code) {
        (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            KeyAction::Command(UiCommand::Quit)
        }
        (_, KeyCode::Char('s')) | (_, KeyCode::Enter) => KeyAction::Command(UiCommand::Start),
        (_, KeyCode::Char('x')) | (_, KeyCode::Esc) => KeyAction::Command(UiCommand::Cancel),
        (_, KeyCode::Char('p')) => KeyAction::Command(UiCommand::Pause(!state.paused)),
        (_, KeyCode::Char('n')) => KeyAction::Command(UiCommand::NewSequence),
        (_, KeyCode::Char('+')) | (_, KeyCode::Char('=')) => {
            if settings.speed >= MAX_SPEED {
                return KeyAction::Ignore;
            }
            KeyAction::Command(UiCommand::Speed(settings.speed + 1))
        }
        (_, KeyCode::Char('-')) => {
            if settings.speed <= MIN_SPEED {
                return KeyAction::Ignore;
            }
            KeyAction::Command(UiCommand::Speed(settings.speed - 1))
        }
        (_, KeyCode::Char(']')) => {
            let n = (settings.array_size + RESIZE_STEP).min(MAX_ARRAY_SIZE);
            if n == settings.array_size {
                return KeyAction::Ignore;
            }
            KeyAction::Command(UiCommand::Resize(n))
        }
        (_, KeyCode::Char('[')) => {
            let n = settings
                .array_size
                .saturating_sub(RESIZE_STEP)
                .max(MIN_ARRAY_SIZE);
            if n == settings.array_size {
                return KeyAction::Ignore;
            }
            KeyAction::Command(UiCommand::Resize(n))
        }
        (_, KeyCode::Char('a')) | (_, KeyCode::Right) => {
            KeyAction::Command(UiCommand::Algorithm(settings.algorithm.cycle(true)))
        }
        (_, KeyCode::Left) => {
            KeyAction::Command(UiCommand::Algorithm(settings.algorithm.cycle(false)))
        }
        (_, KeyCode::Tab) => KeyAction::SwitchTab,
        (_, KeyCode::Char('?')) => KeyAction::ShowHelp,
        _ => KeyAction::Ignore,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Sorter"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("sort-stepper"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_dashboard(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(8)].as_ref())
        .split(area);

    charts::render_sequence(f, main[0], state);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(main[1]);

    let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::Gray));
    let stats = &state.statistics;
    let run_state = if state.paused {
        format!("{} (paused)", state.run_state)
    } else {
        state.run_state.to_string()
    };
    let stat_lines = vec![
        Line::from(vec![
            label("State: "),
            Span::styled(run_state, Style::default().fg(charts::state_color(state))),
        ]),
        Line::from(vec![
            label("Comparisons: "),
            Span::styled(
                stats.comparisons.to_string(),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(vec![
            label("Exchanges: "),
            Span::styled(stats.exchanges.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(vec![
            label("Elapsed: "),
            Span::raw(crate::text_summary::format_elapsed(stats.elapsed_ms)),
        ]),
        Line::from(vec![label("Steps: "), Span::raw(state.steps_seen.to_string())]),
    ];
    let stats_panel =
        Paragraph::new(stat_lines).block(Block::default().borders(Borders::ALL).title("Statistics"));
    f.render_widget(stats_panel, bottom[0]);

    let settings = &state.settings;
    let mut status_lines = vec![
        Line::from(vec![
            label("Algorithm: "),
            Span::styled(settings.algorithm.title(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            label("Size: "),
            Span::raw(settings.array_size.to_string()),
            label("  Speed: "),
            Span::raw(format!("{}/{MAX_SPEED}", settings.speed)),
        ]),
        Line::from(vec![label("Info: "), Span::raw(state.info.as_str())]),
    ];
    if let Some(comments) = state.comments.as_deref() {
        status_lines.push(Line::from(vec![label("Comments: "), Span::raw(comments)]));
    }
    match state.last_run_line() {
        Some(last) => status_lines.push(Line::from(vec![label("Last run: "), Span::raw(last)])),
        None => status_lines.push(Line::from("")),
    }
    status_lines.push(Line::from(
        "Keys: s start | x cancel | p pause | n new | +/- speed | [/] size | a algo | ? help | q quit",
    ));
    let status_panel =
        Paragraph::new(status_lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status_panel, bottom[1]);
}
