use crate::model::RunState;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    /// Cooperative unwind signal; turned into `RunState::Cancelled` at the engine boundary.
    #[error("run cancelled")]
    Cancelled,

    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: RunState,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("sort worker failed: {0}")]
    WorkerFailed(String),
}

impl SortError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SortError::Cancelled)
    }

    pub(crate) fn index_out_of_bounds(index: usize, len: usize) -> Self {
        SortError::InvalidArgument(format!("index {index} out of bounds for length {len}"))
    }
}
