//! Run lifecycle state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("invalid run state transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub to: RunState,
}

/// Lifecycle of one downscaling run.
///
/// States advance strictly forward; [`RunState::Failed`] is terminal
/// and reachable from anywhere. The state is run-level bookkeeping:
/// individual time windows move through the middle stages concurrently,
/// and the run state advances once the whole stage has completed for
/// every window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Configured,
    DomainsLoaded,
    DataFetched,
    SpatiallyInterpolated,
    SpectrallyRemapped,
    TemporallyResampled,
    Exported,
    Done,
    Failed,
}

impl RunState {
    /// The single legal successor in the forward chain.
    fn successor(self) -> Option<RunState> {
        use RunState::*;
        match self {
            Configured => Some(DomainsLoaded),
            DomainsLoaded => Some(DataFetched),
            DataFetched => Some(SpatiallyInterpolated),
            SpatiallyInterpolated => Some(SpectrallyRemapped),
            SpectrallyRemapped => Some(TemporallyResampled),
            TemporallyResampled => Some(Exported),
            Exported => Some(Done),
            Done | Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }

    /// Advance to `to`, which must be the next state in the chain or
    /// [`RunState::Failed`].
    pub fn advance(&mut self, to: RunState) -> Result<(), InvalidTransition> {
        if to == RunState::Failed && !self.is_terminal() {
            info!(from = ?self, "run failed");
            *self = to;
            return Ok(());
        }
        if self.successor() == Some(to) {
            info!(from = ?self, to = ?to, "run state advanced");
            *self = to;
            return Ok(());
        }
        Err(InvalidTransition { from: *self, to })
    }
}
