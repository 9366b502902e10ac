use crate::model::{
    Algorithm, Pacing, RunSummary, SortConfig, SortEvent, Value, MAX_ARRAY_SIZE, MAX_SPEED,
    MIN_SPEED,
};
use crate::orchestrator::{check_size, RunController};
use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Minimum gap between progress lines in text mode.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// Output line routing for stdout/stderr writer.
#[derive(Debug)]
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "sort-stepper",
    version,
    about = "Step-by-step sorting algorithm visualizer with optional TUI"
)]
pub struct Cli {
    /// Sorting algorithm to run
    #[arg(long, value_enum, default_value_t = Algorithm::Bubble)]
    pub algorithm: Algorithm,

    /// Number of random values to generate
    #[arg(long, default_value_t = 50)]
    pub size: usize,

    /// Animation speed from 1 (slowest) to 10 (fastest)
    #[arg(long, default_value_t = 5)]
    pub speed: u8,

    /// Explicit comma-separated sequence to sort (overrides --size)
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub values: Option<Vec<Value>>,

    /// Seed for the random sequence generator
    #[arg(long)]
    pub seed: Option<u64>,

    /// Pause after each step at speed 0, before the per-level reduction
    #[arg(long, default_value = "220ms")]
    pub pause_base: humantime::Duration,

    /// Pause reduction per speed level
    #[arg(long, default_value = "20ms")]
    pub pause_step: humantime::Duration,

    /// Lower bound for the per-step pause
    #[arg(long, default_value = "0ms")]
    pub pause_floor: humantime::Duration,

    /// Pause between bars of the completion sweep
    #[arg(long, default_value = "20ms")]
    pub sweep_pause: humantime::Duration,

    /// Disable all pauses (steps still run one at a time)
    #[arg(long)]
    pub instant: bool,

    /// Print JSON result and exit (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print progress and a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Automatically start a run when the app launches
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub start_on_launch: bool,

    /// Attach custom comments to this run
    #[arg(long)]
    pub comments: Option<String>,

    /// Append logs to this file
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "sort_stepper=debug")
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// True when no interactive terminal UI will be shown.
    pub fn is_headless(&self) -> bool {
        self.json || self.text || !cfg!(feature = "tui")
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    crate::logging::init(&args.log_level, args.log_file.as_deref(), args.is_headless())?;
    tracing::debug!(?cfg, "configuration");

    if !args.is_headless() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args, cfg).await;
        }
    }

    run_headless(args, cfg).await
}

/// Build a `SortConfig` from CLI arguments, applying the same bounds the controller enforces.
pub fn build_config(args: &Cli) -> Result<SortConfig> {
    if !(MIN_SPEED..=MAX_SPEED).contains(&args.speed) {
        anyhow::bail!(
            "--speed {} outside [{MIN_SPEED}, {MAX_SPEED}]",
            args.speed
        );
    }
    let (array_size, values) = match &args.values {
        Some(values) => {
            if values.len() > MAX_ARRAY_SIZE {
                anyhow::bail!(
                    "--values has {} entries; at most {MAX_ARRAY_SIZE} are supported",
                    values.len()
                );
            }
            (values.len(), Some(values.clone()))
        }
        None => {
            check_size(args.size).context("invalid --size")?;
            (args.size, None)
        }
    };

    let pacing = if args.instant {
        Pacing::instant()
    } else {
        Pacing {
            base: Duration::from(args.pause_base),
            step: Duration::from(args.pause_step),
            floor: Duration::from(args.pause_floor),
            sweep: Duration::from(args.sweep_pause),
        }
    };

    Ok(SortConfig {
        algorithm: args.algorithm,
        array_size,
        speed: args.speed,
        values,
        seed: args.seed,
        pacing,
        comments: args.comments.clone(),
    })
}

/// Run once without the TUI and print the result as JSON or text.
async fn run_headless(args: Cli, cfg: SortConfig) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();

    // Ctrl-C cancels the run; the partial result is still reported.
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            futures::future::pending::<()>().await;
        }
    };
    let result = run_once(&cfg, args.json, &out_tx, interrupt).await;

    drop(out_tx);
    let _ = out_handle.await;
    result.map(|_| ())
}

/// Sort once, streaming progress to stderr (text mode only) and the summary to stdout.
/// `interrupt` cancels the run when it resolves.
async fn run_once<F>(
    cfg: &SortConfig,
    json: bool,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
    interrupt: F,
) -> Result<RunSummary>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<SortEvent>();

    let mut controller = RunController::new(cfg, evt_tx).context("failed to prepare sequence")?;
    controller.start().context("failed to start run")?;

    let cancel = controller.cancel_token();
    let interrupt_task = tokio::spawn(async move {
        interrupt.await;
        tracing::info!("interrupt received");
        cancel.cancel();
    });

    // The controller (and with it every event sender) is dropped when this task ends,
    // which closes the event stream below.
    let handle = tokio::spawn(async move { controller.finish().await });

    let mut last_progress = None;
    while let Some(ev) = evt_rx.recv().await {
        if json {
            continue;
        }
        match ev {
            SortEvent::RunStateChanged(state) => {
                let _ = out_tx.send(OutputLine::Stderr(format!("== {state} ==")));
            }
            SortEvent::Statistics(stats) => {
                if progress_due(&mut last_progress, Instant::now(), PROGRESS_INTERVAL) {
                    let _ = out_tx.send(OutputLine::Stderr(format!(
                        "{}: {} comparisons, {} exchanges, {}",
                        cfg.algorithm,
                        stats.comparisons,
                        stats.exchanges,
                        crate::text_summary::format_elapsed(stats.elapsed_ms)
                    )));
                }
            }
            SortEvent::Info(info) => {
                let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
            }
            SortEvent::Reset { .. }
            | SortEvent::Step(_)
            | SortEvent::Settings(_)
            | SortEvent::RunCompleted { .. } => {}
        }
    }

    interrupt_task.abort();
    let summary = handle
        .await
        .context("sort task failed")?
        .context("sort run failed")?;

    if json {
        let out = serde_json::to_string_pretty(&summary)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        for line in crate::text_summary::build_text_summary(&summary).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }
    Ok(summary)
}

/// Rate limiter for progress lines: true at most once per `interval`.
fn progress_due(last: &mut Option<Instant>, now: Instant, interval: Duration) -> bool {
    match last {
        Some(prev) if now.duration_since(*prev) < interval => false,
        _ => {
            *last = Some(now);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RunState;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sort-stepper").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_build_a_valid_config() {
        let cfg = build_config(&parse(&[])).unwrap();
        assert_eq!(cfg.algorithm, Algorithm::Bubble);
        assert_eq!(cfg.array_size, 50);
        assert_eq!(cfg.speed, 5);
        assert_eq!(cfg.pacing, Pacing::default());
        assert!(cfg.values.is_none());
    }

    #[test]
    fn test_explicit_values_override_size() {
        let cfg = build_config(&parse(&["--values", "5,1,4", "--size", "3"])).unwrap();
        assert_eq!(cfg.values, Some(vec![5, 1, 4]));
        assert_eq!(cfg.array_size, 3);
    }

    #[test]
    fn test_out_of_range_settings_are_rejected() {
        assert!(build_config(&parse(&["--size", "4"])).is_err());
        assert!(build_config(&parse(&["--size", "501"])).is_err());
        assert!(build_config(&parse(&["--speed", "0"])).is_err());
        assert!(build_config(&parse(&["--speed", "11"])).is_err());
    }

    #[test]
    fn test_algorithm_and_pacing_flags() {
        let cfg = build_config(&parse(&["--algorithm", "quick", "--instant"])).unwrap();
        assert_eq!(cfg.algorithm, Algorithm::Quick);
        assert_eq!(cfg.pacing, Pacing::instant());

        let cfg = build_config(&parse(&["--pause-base", "1s", "--pause-floor", "50ms"])).unwrap();
        assert_eq!(cfg.pacing.base, Duration::from_secs(1));
        assert_eq!(cfg.pacing.floor, Duration::from_millis(50));

        assert!(Cli::try_parse_from(["sort-stepper", "--algorithm", "bogo"]).is_err());
        assert!(Cli::try_parse_from(["sort-stepper", "--json", "--text"]).is_err());
    }

    #[test]
    fn test_progress_is_throttled() {
        let start = Instant::now();
        let mut last = None;
        assert!(progress_due(&mut last, start, PROGRESS_INTERVAL));
        assert!(!progress_due(
            &mut last,
            start + Duration::from_millis(100),
            PROGRESS_INTERVAL
        ));
        assert!(progress_due(
            &mut last,
            start + Duration::from_millis(250),
            PROGRESS_INTERVAL
        ));
    }

    /// Split what a headless run wrote into stdout and stderr lines.
    fn collect(rx: &mut mpsc::UnboundedReceiver<OutputLine>) -> (Vec<String>, Vec<String>) {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        while let Ok(line) = rx.try_recv() {
            match line {
                OutputLine::Stdout(s) => out.push(s),
                OutputLine::Stderr(s) => err.push(s),
            }
        }
        (out, err)
    }

    #[tokio::test]
    async fn test_text_run_reports_progress_and_summary() {
        let cfg = build_config(&parse(&["--values", "3,1,2", "--instant", "--text"])).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let summary = run_once(&cfg, false, &tx, futures::future::pending::<()>())
            .await
            .unwrap();
        assert_eq!(summary.state, RunState::Completed);
        assert_eq!(summary.output, vec![1, 2, 3]);

        let (out, err) = collect(&mut rx);
        assert!(out[0].ends_with(": completed"), "{out:?}");
        assert!(out.iter().any(|l| l.starts_with("Output:")));
        assert!(err.iter().any(|l| l == "== running =="), "{err:?}");
        assert!(err.iter().any(|l| l.contains("comparisons")), "{err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_run_still_prints_summary() {
        let cfg = build_config(&parse(&["--values", "5,4,3,2,1"])).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let interrupt = tokio::time::sleep(Duration::from_millis(50));
        let summary = run_once(&cfg, false, &tx, interrupt).await.unwrap();
        assert_eq!(summary.state, RunState::Cancelled);
        assert!(!summary.sorted);

        let (out, _) = collect(&mut rx);
        assert!(out[0].ends_with(": cancelled"), "{out:?}");
        assert!(out.iter().any(|l| l.contains("partial ordering")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_json_mode_prints_only_the_summary() {
        let cfg = build_config(&parse(&["--values", "5,4,3,2,1", "--json"])).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let interrupt = tokio::time::sleep(Duration::from_millis(50));
        run_once(&cfg, true, &tx, interrupt).await.unwrap();

        let (out, err) = collect(&mut rx);
        assert!(err.is_empty(), "{err:?}");
        assert_eq!(out.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(&out[0]).unwrap();
        assert_eq!(parsed["state"], "Cancelled");
        assert_eq!(parsed["initial"], serde_json::json!([5, 4, 3, 2, 1]));
    }
}
