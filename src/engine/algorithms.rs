//! The five sorting procedures, written only against the [`Gate`].
//!
//! None of them look at run state. A cancelled gate fails the next step with
//! `SortError::Cancelled` and `?` carries it out through every loop and recursive call.

use crate::engine::gate::Gate;
use crate::engine::SortError;
use crate::model::Algorithm;
use futures::future::BoxFuture;
use std::cmp::Ordering;

pub async fn run(algorithm: Algorithm, gate: &mut Gate<'_>) -> Result<(), SortError> {
    let n = gate.len();
    match algorithm {
        Algorithm::Bubble => bubble_sort(gate).await,
        Algorithm::Selection => selection_sort(gate).await,
        Algorithm::Insertion => insertion_sort(gate).await,
        Algorithm::Merge if n > 1 => merge_sort(gate, 0, n - 1).await,
        Algorithm::Quick if n > 1 => quick_sort(gate, 0, n - 1).await,
        Algorithm::Merge | Algorithm::Quick => Ok(()),
    }
}

pub async fn bubble_sort(gate: &mut Gate<'_>) -> Result<(), SortError> {
    let n = gate.len();
    for pass in 0..n.saturating_sub(1) {
        for j in 0..n - pass - 1 {
            if gate.compare(j, j + 1).await? == Ordering::Greater {
                gate.swap(j, j + 1).await?;
            }
        }
    }
    Ok(())
}

pub async fn selection_sort(gate: &mut Gate<'_>) -> Result<(), SortError> {
    let n = gate.len();
    for i in 0..n.saturating_sub(1) {
        let mut min_idx = i;
        for j in i + 1..n {
            if gate.compare(min_idx, j).await? == Ordering::Greater {
                min_idx = j;
            }
        }
        if min_idx != i {
            gate.swap(i, min_idx).await?;
        }
    }
    Ok(())
}

/// Shifts by overwrite rather than swapping. The boundary comparison that stops the scan
/// is still counted, and the key placement is a step but not an exchange.
pub async fn insertion_sort(gate: &mut Gate<'_>) -> Result<(), SortError> {
    let n = gate.len();
    for i in 1..n {
        let key = gate.value(i)?;
        let mut hole = i;
        while hole > 0 {
            let j = hole - 1;
            let left = gate.value(j)?;
            if gate.compare_held(left, key, [j, i]).await? != Ordering::Greater {
                break;
            }
            gate.overwrite(hole, left).await?;
            hole = j;
        }
        gate.place(hole, key).await?;
    }
    Ok(())
}

pub fn merge_sort<'g, 'a: 'g>(
    gate: &'g mut Gate<'a>,
    left: usize,
    right: usize,
) -> BoxFuture<'g, Result<(), SortError>> {
    Box::pin(async move {
        if left >= right {
            return Ok(());
        }
        let mid = left + (right - left) / 2;
        merge_sort(&mut *gate, left, mid).await?;
        merge_sort(&mut *gate, mid + 1, right).await?;
        merge(gate, left, mid, right).await
    })
}

/// Merge the sorted runs `[left, mid]` and `[mid + 1, right]`. Every write counts as an exchange.
async fn merge(
    gate: &mut Gate<'_>,
    left: usize,
    mid: usize,
    right: usize,
) -> Result<(), SortError> {
    let lower = gate.snapshot(left..=mid)?;
    let upper = gate.snapshot(mid + 1..=right)?;

    let (mut i, mut j, mut k) = (0, 0, left);
    while i < lower.len() && j < upper.len() {
        let ord = gate
            .compare_held(lower[i], upper[j], [left + i, mid + 1 + j])
            .await?;
        let value = if ord != Ordering::Greater {
            i += 1;
            lower[i - 1]
        } else {
            j += 1;
            upper[j - 1]
        };
        gate.overwrite(k, value).await?;
        k += 1;
    }
    for &value in lower[i..].iter().chain(&upper[j..]) {
        gate.overwrite(k, value).await?;
        k += 1;
    }
    Ok(())
}

pub fn quick_sort<'g, 'a: 'g>(
    gate: &'g mut Gate<'a>,
    low: usize,
    high: usize,
) -> BoxFuture<'g, Result<(), SortError>> {
    Box::pin(async move {
        if low >= high {
            return Ok(());
        }
        let pivot = partition(&mut *gate, low, high).await?;
        if pivot > low {
            quick_sort(&mut *gate, low, pivot - 1).await?;
        }
        quick_sort(gate, pivot + 1, high).await
    })
}

/// Lomuto partition around the value at `high`; returns the pivot's final position.
pub async fn partition(gate: &mut Gate<'_>, low: usize, high: usize) -> Result<usize, SortError> {
    // `next` is the slot the next smaller-than-pivot value moves into.
    let mut next = low;
    for j in low..high {
        if gate.compare(j, high).await? == Ordering::Less {
            if next != j {
                gate.swap(next, j).await?;
            }
            next += 1;
        }
    }
    gate.swap(next, high).await?;
    Ok(next)
}
