//! Sequence store: the values being sorted plus the statistics of the current run.
//!
//! Every mutation or comparison performed here is counted and reported on the event
//! channel. Pacing and cancellation live one layer up, in the gate.

use crate::engine::SortError;
use crate::model::{RunStatistics, SortEvent, StepEvent, StepKind, Value, MAX_ARRAY_SIZE};
use rand::Rng;
use std::cmp::Ordering;
use std::time::Duration;
use tokio::time::Instant;
use tokio::sync::mpsc::UnboundedSender;

/// Generate `len` random values in [`crate::model::VALUE_RANGE`].
pub fn random_sequence<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<Value> {
    (0..len)
        .map(|_| rng.gen_range(crate::model::VALUE_RANGE))
        .collect()
}

pub struct SequenceStore {
    values: Vec<Value>,
    stats: RunStatistics,
    epoch: u64,
    steps: u64,
    run_started: Option<Instant>,
    event_tx: UnboundedSender<SortEvent>,
}

impl SequenceStore {
    pub fn new(values: Vec<Value>, event_tx: UnboundedSender<SortEvent>) -> Result<Self, SortError> {
        check_len(values.len())?;
        let store = Self {
            values,
            stats: RunStatistics::default(),
            epoch: 1,
            steps: 0,
            run_started: None,
            event_tx,
        };
        store.emit_reset();
        Ok(store)
    }

    /// Swap in a whole new sequence. Statistics start over and renderers get a full redraw.
    pub fn replace(&mut self, values: Vec<Value>) -> Result<(), SortError> {
        check_len(values.len())?;
        self.values = values;
        self.stats = RunStatistics::default();
        self.steps = 0;
        self.run_started = None;
        self.epoch += 1;
        self.emit_reset();
        tracing::debug!(len = self.values.len(), epoch = self.epoch, "sequence replaced");
        Ok(())
    }

    /// Reset statistics and open a new epoch for the run that is about to start.
    pub fn begin_run(&mut self) -> u64 {
        self.stats = RunStatistics::default();
        self.steps = 0;
        self.run_started = Some(Instant::now());
        self.epoch += 1;
        self.emit_reset();
        self.emit_statistics();
        self.epoch
    }

    /// Freeze elapsed time for the run and publish the final statistics.
    pub fn end_run(&mut self, elapsed: Duration) {
        self.stats.elapsed_ms = elapsed.as_millis() as u64;
        self.run_started = None;
        self.emit_statistics();
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn statistics(&self) -> RunStatistics {
        self.stats
    }

    pub fn value(&self, index: usize) -> Result<Value, SortError> {
        self.values
            .get(index)
            .copied()
            .ok_or_else(|| SortError::index_out_of_bounds(index, self.values.len()))
    }

    /// Three-way comparison of the values at `i` and `j`. Always counted.
    pub fn compare_values(&mut self, i: usize, j: usize) -> Result<Ordering, SortError> {
        let a = self.value(i)?;
        let b = self.value(j)?;
        self.compare_held(a, b, [i, j])
    }

    /// Compare two values the caller already holds, highlighted at `at`. Always counted.
    pub fn compare_held(
        &mut self,
        a: Value,
        b: Value,
        at: [usize; 2],
    ) -> Result<Ordering, SortError> {
        self.check_index(at[0])?;
        self.check_index(at[1])?;
        self.stats.comparisons += 1;
        self.emit_step(StepKind::Compare, at.to_vec());
        self.emit_statistics();
        Ok(a.cmp(&b))
    }

    /// Swap positions `i` and `j`. Counted even when `i == j`.
    pub fn exchange(&mut self, i: usize, j: usize) -> Result<(), SortError> {
        self.check_index(i)?;
        self.check_index(j)?;
        self.values.swap(i, j);
        self.stats.exchanges += 1;
        self.emit_step(StepKind::Swap, vec![i, j]);
        self.emit_statistics();
        Ok(())
    }

    /// Write a single position. `counted` decides whether it shows up as an exchange.
    pub fn overwrite(&mut self, index: usize, value: Value, counted: bool) -> Result<(), SortError> {
        self.check_index(index)?;
        self.values[index] = value;
        self.emit_step(StepKind::Overwrite, vec![index]);
        if counted {
            self.stats.exchanges += 1;
            self.emit_statistics();
        }
        Ok(())
    }

    pub fn mark_sorted(&mut self, index: usize) -> Result<(), SortError> {
        self.check_index(index)?;
        self.emit_step(StepKind::Sorted, vec![index]);
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), SortError> {
        if index < self.values.len() {
            Ok(())
        } else {
            Err(SortError::index_out_of_bounds(index, self.values.len()))
        }
    }

    fn emit_step(&mut self, kind: StepKind, indices: Vec<usize>) {
        self.steps += 1;
        let values = indices.iter().map(|&i| self.values[i]).collect();
        tracing::trace!(?kind, ?indices, ordinal = self.steps, "step");
        let _ = self.event_tx.send(SortEvent::Step(StepEvent {
            kind,
            indices,
            values,
            epoch: self.epoch,
            ordinal: self.steps,
        }));
    }

    fn emit_statistics(&mut self) {
        if let Some(started) = self.run_started {
            self.stats.elapsed_ms = started.elapsed().as_millis() as u64;
        }
        let _ = self.event_tx.send(SortEvent::Statistics(self.stats));
    }

    fn emit_reset(&self) {
        let _ = self.event_tx.send(SortEvent::Reset {
            values: self.values.clone(),
            epoch: self.epoch,
        });
    }
}

fn check_len(len: usize) -> Result<(), SortError> {
    if len > MAX_ARRAY_SIZE {
        return Err(SortError::InvalidArgument(format!(
            "sequence of {len} values exceeds the maximum of {MAX_ARRAY_SIZE}"
        )));
    }
    Ok(())
}
