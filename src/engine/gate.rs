//! Instrumented gate between the algorithms and the sequence store.
//!
//! Each step checks for cancellation first, then performs the store operation (which
//! counts and reports it), and finally suspends the caller for the paced duration.
//! The await points in here are the only places a running algorithm yields.

use crate::engine::sequence::SequenceStore;
use crate::engine::SortError;
use crate::model::{Pacing, Value, MAX_SPEED, MIN_SPEED};
use std::cmp::Ordering;
use std::ops::RangeInclusive;
use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering as AtomicOrdering},
    Arc,
};
use std::time::Duration;

const PAUSE_POLL: Duration = Duration::from_millis(50);

/// Shared cancellation flag, observed by the gate before every step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, AtomicOrdering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PauseFlag(Arc<AtomicBool>);

impl PauseFlag {
    pub fn set(&self, paused: bool) {
        self.0.store(paused, AtomicOrdering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

/// Speed level shared between the caller (who may change it mid-run) and the gate.
#[derive(Debug, Clone)]
pub struct SpeedHandle(Arc<AtomicU8>);

impl SpeedHandle {
    pub fn new(level: u8) -> Result<Self, SortError> {
        check_speed(level)?;
        Ok(Self(Arc::new(AtomicU8::new(level))))
    }

    pub fn set(&self, level: u8) -> Result<(), SortError> {
        check_speed(level)?;
        self.0.store(level, AtomicOrdering::Relaxed);
        Ok(())
    }

    pub fn get(&self) -> u8 {
        self.0.load(AtomicOrdering::Relaxed)
    }
}

fn check_speed(level: u8) -> Result<(), SortError> {
    if (MIN_SPEED..=MAX_SPEED).contains(&level) {
        Ok(())
    } else {
        Err(SortError::InvalidArgument(format!(
            "speed {level} outside [{MIN_SPEED}, {MAX_SPEED}]"
        )))
    }
}

pub struct Gate<'a> {
    store: &'a mut SequenceStore,
    cancel: &'a CancelToken,
    paused: &'a PauseFlag,
    speed: &'a SpeedHandle,
    pacing: Pacing,
}

impl<'a> Gate<'a> {
    pub fn new(
        store: &'a mut SequenceStore,
        cancel: &'a CancelToken,
        paused: &'a PauseFlag,
        speed: &'a SpeedHandle,
        pacing: Pacing,
    ) -> Self {
        Self {
            store,
            cancel,
            paused,
            speed,
            pacing,
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Plain read; not a step and never suspends.
    pub fn value(&self, index: usize) -> Result<Value, SortError> {
        self.store.value(index)
    }

    /// Copy out an inclusive index range; not a step.
    pub fn snapshot(&self, range: RangeInclusive<usize>) -> Result<Vec<Value>, SortError> {
        let end = *range.end();
        self.store
            .values()
            .get(range)
            .map(<[Value]>::to_vec)
            .ok_or_else(|| SortError::index_out_of_bounds(end, self.store.len()))
    }

    pub async fn compare(&mut self, i: usize, j: usize) -> Result<Ordering, SortError> {
        self.enter().await?;
        let ord = self.store.compare_values(i, j)?;
        self.settle(self.step_pause()).await;
        Ok(ord)
    }

    /// Compare two values held by the algorithm, highlighted at positions `at`.
    pub async fn compare_held(
        &mut self,
        a: Value,
        b: Value,
        at: [usize; 2],
    ) -> Result<Ordering, SortError> {
        self.enter().await?;
        let ord = self.store.compare_held(a, b, at)?;
        self.settle(self.step_pause()).await;
        Ok(ord)
    }

    pub async fn swap(&mut self, i: usize, j: usize) -> Result<(), SortError> {
        self.enter().await?;
        self.store.exchange(i, j)?;
        self.settle(self.step_pause()).await;
        Ok(())
    }

    /// Single-position write counted as an exchange.
    pub async fn overwrite(&mut self, index: usize, value: Value) -> Result<(), SortError> {
        self.enter().await?;
        self.store.overwrite(index, value, true)?;
        self.settle(self.step_pause()).await;
        Ok(())
    }

    /// Single-position write that is not counted as an exchange.
    pub async fn place(&mut self, index: usize, value: Value) -> Result<(), SortError> {
        self.enter().await?;
        self.store.overwrite(index, value, false)?;
        self.settle(self.step_pause()).await;
        Ok(())
    }

    pub async fn mark_sorted(&mut self, index: usize) -> Result<(), SortError> {
        self.enter().await?;
        self.store.mark_sorted(index)?;
        self.settle(self.pacing.sweep).await;
        Ok(())
    }

    fn step_pause(&self) -> Duration {
        self.pacing.pause_for(self.speed.get())
    }

    /// Hold at the step boundary while paused, then refuse to proceed if cancelled.
    async fn enter(&self) -> Result<(), SortError> {
        while self.paused.is_paused() && !self.cancel.is_cancelled() {
            tokio::time::sleep(PAUSE_POLL).await;
        }
        if self.cancel.is_cancelled() {
            return Err(SortError::Cancelled);
        }
        Ok(())
    }

    async fn settle(&self, pause: Duration) {
        if pause.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(pause).await;
        }
    }
}
