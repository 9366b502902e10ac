pub mod algorithms;
mod error;
pub mod gate;
pub mod sequence;

#[cfg(test)]
mod tests;

pub use error::SortError;
pub use gate::{CancelToken, Gate, PauseFlag, SpeedHandle};
pub use sequence::SequenceStore;

use crate::model::{Algorithm, Pacing, RunState};
use tokio::time::Instant;

/// What a finished engine hands back: the store (always) and how the run ended.
pub struct EngineOutcome {
    pub store: SequenceStore,
    /// `Completed` or `Cancelled`; any other error is a fault.
    pub result: Result<RunState, SortError>,
}

/// Runs one algorithm plus the completion sweep over a store it owns exclusively.
pub struct SortEngine {
    store: SequenceStore,
    algorithm: Algorithm,
    pacing: Pacing,
    cancel: CancelToken,
    paused: PauseFlag,
    speed: SpeedHandle,
}

impl SortEngine {
    pub fn new(
        store: SequenceStore,
        algorithm: Algorithm,
        pacing: Pacing,
        cancel: CancelToken,
        paused: PauseFlag,
        speed: SpeedHandle,
    ) -> Self {
        Self {
            store,
            algorithm,
            pacing,
            cancel,
            paused,
            speed,
        }
    }

    pub async fn run(mut self) -> EngineOutcome {
        let started = Instant::now();
        let algorithm = self.algorithm;

        let result = {
            let mut gate = Gate::new(
                &mut self.store,
                &self.cancel,
                &self.paused,
                &self.speed,
                self.pacing,
            );
            match algorithms::run(algorithm, &mut gate).await {
                Ok(()) => completion_sweep(&mut gate).await,
                Err(e) => Err(e),
            }
        };

        self.store.end_run(started.elapsed());
        let stats = self.store.statistics();

        let result = match result {
            Ok(()) => Ok(RunState::Completed),
            Err(SortError::Cancelled) => Ok(RunState::Cancelled),
            Err(e) => {
                tracing::error!(%algorithm, error = %e, "sort run faulted");
                Err(e)
            }
        };
        if let Ok(state) = &result {
            tracing::info!(
                %algorithm,
                %state,
                comparisons = stats.comparisons,
                exchanges = stats.exchanges,
                elapsed_ms = stats.elapsed_ms,
                "sort run finished"
            );
        }

        EngineOutcome {
            store: self.store,
            result,
        }
    }
}

/// Mark every index as sorted, one at a time, through the same gate as the algorithms.
pub async fn completion_sweep(gate: &mut Gate<'_>) -> Result<(), SortError> {
    for index in 0..gate.len() {
        gate.mark_sorted(index).await?;
    }
    Ok(())
}
