//! Engine behaviour tests.


use super::{CancelToken, PauseFlag, SequenceStore, SortEngine, SpeedHandle};
use crate::model::{Algorithm, Pacing, RunState, RunStatistics, SortEvent, StepEvent, StepKind, Value};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::sync::mpsc;

pub(super) struct FinishedRun {
    pub output: Vec<Value>,
    pub stats: RunStatistics,
    pub steps: Vec<StepEvent>,
    pub state: RunState,
}

impl FinishedRun {
    /// Steps produced by the algorithm itself, without the completion sweep.
    pub fn algorithm_steps(&self) -> Vec<&StepEvent> {
        self.steps
            .iter()
            .filter(|s| s.kind != StepKind::Sorted)
            .collect()
    }

    pub fn count(&self, kind: StepKind) -> usize {
        self.steps.iter().filter(|s| s.kind == kind).count()
    }
}

pub(super) fn drain_steps(rx: &mut mpsc::UnboundedReceiver<SortEvent>) -> Vec<StepEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if let SortEvent::Step(step) = ev {
            out.push(step);
        }
    }
    out
}

pub(super) fn engine(
    algorithm: Algorithm,
    values: Vec<Value>,
    pacing: Pacing,
    cancel: CancelToken,
) -> (SortEngine, mpsc::UnboundedReceiver<SortEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut store = SequenceStore::new(values, tx).unwrap();
    store.begin_run();
    let engine = SortEngine::new(
        store,
        algorithm,
        pacing,
        cancel,
        PauseFlag::default(),
        SpeedHandle::new(10).unwrap(),
    );
    (engine, rx)
}

pub(super) async fn run_to_end(algorithm: Algorithm, values: Vec<Value>) -> FinishedRun {
    let (engine, mut rx) = engine(algorithm, values, Pacing::instant(), CancelToken::new());
    let outcome = engine.run().await;
    let state = outcome.result.expect("run should not fault");
    FinishedRun {
        output: outcome.store.values().to_vec(),
        stats: outcome.store.statistics(),
        steps: drain_steps(&mut rx),
        state,
    }
}

pub(super) fn seeded_values(seed: u64, len: usize, max: Value) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(0..max)).collect()
}

pub(super) fn is_permutation(a: &[Value], b: &[Value]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}
