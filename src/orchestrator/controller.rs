//! Run lifecycle controller.
//!
//! Owns the sequence between runs, the cancellation token and the run state. A run moves
//! the store into a worker task; the store comes back through the join handle, so exactly
//! one party holds it at any time.

use crate::engine::sequence::random_sequence;
use crate::engine::{
    CancelToken, EngineOutcome, PauseFlag, SequenceStore, SortEngine, SortError, SpeedHandle,
};
use crate::model::{
    Algorithm, InfoEvent, Pacing, RunState, RunStatistics, RunSummary, Settings, SortConfig,
    SortEvent, Value, MAX_ARRAY_SIZE, MIN_ARRAY_SIZE,
};
use rand::{rngs::StdRng, SeedableRng};
use tokio::time::Instant;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinError, JoinHandle};

use super::post_process::build_summary;

/// Commands emitted by UI layers to drive the controller.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Start,
    Cancel,
    Pause(bool),
    NewSequence,
    Resize(usize),
    Speed(u8),
    Algorithm(Algorithm),
    Quit,
}

/// Bookkeeping for the run currently held by a worker task.
struct ActiveRun {
    handle: JoinHandle<EngineOutcome>,
    algorithm: Algorithm,
    initial: Vec<Value>,
    started: Instant,
}

pub struct RunController {
    algorithm: Algorithm,
    array_size: usize,
    speed: SpeedHandle,
    pacing: Pacing,
    comments: Option<String>,
    cancel: CancelToken,
    paused: PauseFlag,
    state: RunState,
    store: Option<SequenceStore>,
    active: Option<ActiveRun>,
    rng: StdRng,
    event_tx: UnboundedSender<SortEvent>,
}

pub(crate) fn check_size(n: usize) -> Result<(), SortError> {
    if (MIN_ARRAY_SIZE..=MAX_ARRAY_SIZE).contains(&n) {
        Ok(())
    } else {
        Err(SortError::InvalidArgument(format!(
            "array size {n} outside [{MIN_ARRAY_SIZE}, {MAX_ARRAY_SIZE}]"
        )))
    }
}

impl RunController {
    pub fn new(cfg: &SortConfig, event_tx: UnboundedSender<SortEvent>) -> Result<Self, SortError> {
        let speed = SpeedHandle::new(cfg.speed)?;
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let values = match &cfg.values {
            Some(values) => values.clone(),
            None => {
                check_size(cfg.array_size)?;
                random_sequence(&mut rng, cfg.array_size)
            }
        };
        let array_size = values.len();
        let store = SequenceStore::new(values, event_tx.clone())?;

        let controller = Self {
            algorithm: cfg.algorithm,
            array_size,
            speed,
            pacing: cfg.pacing,
            comments: cfg.comments.clone(),
            cancel: CancelToken::new(),
            paused: PauseFlag::default(),
            state: RunState::Idle,
            store: Some(store),
            active: None,
            rng,
            event_tx,
        };
        controller.emit_settings();
        let _ = controller
            .event_tx
            .send(SortEvent::RunStateChanged(RunState::Idle));
        Ok(controller)
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn array_size(&self) -> usize {
        self.array_size
    }

    pub fn speed(&self) -> u8 {
        self.speed.get()
    }

    /// Values between runs; `None` while a worker holds the store.
    pub fn values(&self) -> Option<&[Value]> {
        self.store.as_ref().map(SequenceStore::values)
    }

    pub fn statistics(&self) -> Option<RunStatistics> {
        self.store.as_ref().map(SequenceStore::statistics)
    }

    /// Handle for cancelling from another task without going through the controller.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            algorithm: self.algorithm,
            array_size: self.array_size,
            speed: self.speed.get(),
        }
    }

    pub fn configure_size(&mut self, n: usize) -> Result<(), SortError> {
        check_size(n)?;
        self.ensure_not_running("resize")?;
        let values = random_sequence(&mut self.rng, n);
        self.install(values)?;
        self.array_size = n;
        self.emit_settings();
        Ok(())
    }

    /// Allowed mid-run; the gate picks the new level up at its next step.
    pub fn configure_speed(&mut self, level: u8) -> Result<(), SortError> {
        self.speed.set(level)?;
        self.emit_settings();
        Ok(())
    }

    pub fn select_algorithm(&mut self, name: &str) -> Result<Algorithm, SortError> {
        let algorithm: Algorithm = name.parse()?;
        self.set_algorithm(algorithm);
        Ok(algorithm)
    }

    /// Takes effect at the next `start`.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
        self.emit_settings();
    }

    pub fn request_new_sequence(&mut self) -> Result<(), SortError> {
        self.ensure_not_running("generate a new sequence")?;
        let values = random_sequence(&mut self.rng, self.array_size);
        self.install(values)
    }

    pub fn load_sequence(&mut self, values: Vec<Value>) -> Result<(), SortError> {
        self.ensure_not_running("load a sequence")?;
        let len = values.len();
        self.install(values)?;
        if len != self.array_size {
            self.array_size = len;
            self.emit_settings();
        }
        Ok(())
    }

    /// Spawn the selected algorithm over the whole sequence. Must be called inside a Tokio runtime.
    pub fn start(&mut self) -> Result<(), SortError> {
        self.ensure_not_running("start")?;
        let mut store = self.store.take().ok_or(SortError::InvalidState {
            operation: "start",
            state: self.state,
        })?;

        self.cancel.reset();
        self.paused.set(false);
        let initial = store.values().to_vec();
        let epoch = store.begin_run();
        tracing::info!(
            algorithm = %self.algorithm,
            len = initial.len(),
            epoch,
            speed = self.speed.get(),
            "sort run starting"
        );
        self.set_state(RunState::Running);

        let engine = SortEngine::new(
            store,
            self.algorithm,
            self.pacing,
            self.cancel.clone(),
            self.paused.clone(),
            self.speed.clone(),
        );
        self.active = Some(ActiveRun {
            handle: tokio::spawn(engine.run()),
            algorithm: self.algorithm,
            initial,
            started: Instant::now(),
        });
        Ok(())
    }

    /// Request cancellation. Returns immediately; the run unwinds at its next step.
    pub fn cancel(&self) {
        if !self.is_running() {
            return;
        }
        tracing::info!(algorithm = %self.algorithm, "cancellation requested");
        self.cancel.cancel();
    }

    pub fn pause(&self, paused: bool) {
        if self.is_running() {
            self.paused.set(paused);
        }
    }

    /// Wait for the in-flight run and apply its outcome.
    pub async fn finish(&mut self) -> Result<RunSummary, SortError> {
        let joined = match self.active.as_mut() {
            Some(active) => (&mut active.handle).await,
            None => {
                return Err(SortError::InvalidState {
                    operation: "finish",
                    state: self.state,
                })
            }
        };
        self.complete(joined)
    }

    /// Join handle of the active run, for callers that `select!` on completion.
    pub(crate) fn worker_mut(&mut self) -> Option<&mut JoinHandle<EngineOutcome>> {
        self.active.as_mut().map(|a| &mut a.handle)
    }

    /// Apply a joined worker result. The handle must not be polled again afterwards.
    pub(crate) fn complete(
        &mut self,
        joined: Result<EngineOutcome, JoinError>,
    ) -> Result<RunSummary, SortError> {
        let active = self.active.take().ok_or(SortError::InvalidState {
            operation: "complete",
            state: self.state,
        })?;
        tracing::debug!(
            wall_ms = active.started.elapsed().as_millis() as u64,
            "worker joined"
        );

        match joined {
            Ok(EngineOutcome { store, result }) => {
                let output = store.values().to_vec();
                let statistics = store.statistics();
                self.store = Some(store);
                match result {
                    Ok(state) => {
                        self.set_state(state);
                        Ok(build_summary(
                            active.algorithm,
                            state,
                            statistics,
                            self.speed.get(),
                            active.initial,
                            output,
                            self.comments.clone(),
                        ))
                    }
                    Err(e) => {
                        self.set_state(RunState::Idle);
                        Err(e)
                    }
                }
            }
            Err(join_err) => {
                // The store went down with the worker; start over with a fresh sequence.
                tracing::error!(error = %join_err, "sort worker failed");
                let values = random_sequence(&mut self.rng, self.array_size);
                self.store = Some(SequenceStore::new(values, self.event_tx.clone())?);
                self.set_state(RunState::Idle);
                Err(SortError::WorkerFailed(join_err.to_string()))
            }
        }
    }

    fn ensure_not_running(&self, operation: &'static str) -> Result<(), SortError> {
        if self.is_running() {
            tracing::debug!(operation, "rejected while running");
            return Err(SortError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn install(&mut self, values: Vec<Value>) -> Result<(), SortError> {
        let store = self.store.as_mut().ok_or(SortError::InvalidState {
            operation: "replace the sequence",
            state: self.state,
        })?;
        store.replace(values)?;
        let size = store.len();
        tracing::debug!(size, epoch = store.epoch(), "sequence installed");
        self.set_state(RunState::Idle);
        let _ = self
            .event_tx
            .send(SortEvent::Info(InfoEvent::SequenceGenerated { size }));
        Ok(())
    }

    fn set_state(&mut self, state: RunState) {
        self.state = state;
        let _ = self.event_tx.send(SortEvent::RunStateChanged(state));
    }

    fn emit_settings(&self) {
        let _ = self.event_tx.send(SortEvent::Settings(self.settings()));
    }
}

fn reject(event_tx: &UnboundedSender<SortEvent>, command: &str, err: &SortError) {
    tracing::warn!(command, error = %err, "command rejected");
    let _ = event_tx.send(SortEvent::Info(InfoEvent::Rejected {
        command: command.to_string(),
        reason: err.to_string(),
    }));
}

/// Drive the controller from UI commands and emit completion events back to presentation layers.
pub(crate) async fn run_controller(
    mut controller: RunController,
    event_tx: UnboundedSender<SortEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
    start_on_launch: bool,
) -> anyhow::Result<()> {
    if start_on_launch {
        if let Err(e) = controller.start() {
            reject(&event_tx, "start", &e);
        }
    }
    let mut quit_pending = false;
    let mut cmd_closed = false;

    loop {
        tokio::select! {
            // A closed channel yields `None` forever; stop polling it once seen.
            cmd = cmd_rx.recv(), if !cmd_closed => {
                cmd_closed = cmd.is_none();
                match cmd {
                    Some(UiCommand::Start) => {
                        if let Err(e) = controller.start() {
                            reject(&event_tx, "start", &e);
                        }
                    }
                    Some(UiCommand::Cancel) => {
                        if controller.is_running() {
                            controller.cancel();
                            let _ = event_tx.send(SortEvent::Info(InfoEvent::Cancelling));
                        }
                    }
                    Some(UiCommand::Pause(p)) => {
                        if controller.is_running() {
                            controller.pause(p);
                            let _ = event_tx.send(SortEvent::Info(InfoEvent::Paused(p)));
                        }
                    }
                    Some(UiCommand::NewSequence) => {
                        if let Err(e) = controller.request_new_sequence() {
                            reject(&event_tx, "new sequence", &e);
                        }
                    }
                    Some(UiCommand::Resize(n)) => {
                        if let Err(e) = controller.configure_size(n) {
                            reject(&event_tx, "resize", &e);
                        }
                    }
                    Some(UiCommand::Speed(level)) => {
                        if let Err(e) = controller.configure_speed(level) {
                            reject(&event_tx, "speed", &e);
                        }
                    }
                    Some(UiCommand::Algorithm(a)) => controller.set_algorithm(a),
                    Some(UiCommand::Quit) | None => {
                        // Let an active run unwind so the store is returned before exiting.
                        if !controller.is_running() {
                            break Ok(());
                        }
                        if !quit_pending {
                            quit_pending = true;
                            controller.cancel();
                        }
                    }
                }
            }
            // The handle is only borrowed here; `complete` takes it once this branch wins.
            joined = async {
                match controller.worker_mut() {
                    Some(handle) => handle.await,
                    None => futures::future::pending().await,
                }
            } => {
                match controller.complete(joined) {
                    Ok(summary) => {
                        let _ = event_tx.send(SortEvent::RunCompleted { summary: Box::new(summary) });
                    }
                    Err(e) => {
                        let _ = event_tx.send(SortEvent::Info(InfoEvent::Message(format!(
                            "Run failed: {e}"
                        ))));
                    }
                }
                if quit_pending {
                    break Ok(());
                }
            }
        }
    }
}
