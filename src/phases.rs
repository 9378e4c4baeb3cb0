//! Lifecycle phases and their actions.
//!
//! Each run advances one batch through exactly one phase. Progress is only
//! recorded (by the caller, through the tagger) after the whole phase
//! succeeds, so a failed phase is retried from scratch on the next run.

pub mod detach;
pub mod drain;
pub mod terminate;

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::error::{CyklistError, Result};
use crate::provider::{AutoscalingApi, ComputeApi, NodeDrainer};
use crate::types::Instance;

/// Fixed decommission sequence: detach, then drain, then terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Detach,
    Drain,
    Terminate,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Detach, Phase::Drain, Phase::Terminate];

    /// Tag value for this phase.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Detach => "detach",
            Self::Drain => "drain",
            Self::Terminate => "terminate",
        }
    }

    /// Phase an instance moves to once this one succeeds. `None` means the
    /// instance leaves the lifecycle.
    pub const fn next(&self) -> Option<Phase> {
        match self {
            Self::Detach => Some(Self::Drain),
            Self::Drain => Some(Self::Terminate),
            Self::Terminate => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = CyklistError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| CyklistError::UnknownPhase(s.to_string()))
    }
}

/// Providers a phase action may call.
pub struct PhaseContext<'a> {
    pub compute: &'a dyn ComputeApi,
    pub autoscaling: &'a dyn AutoscalingApi,
    pub drainer: &'a dyn NodeDrainer,
    pub control_tag: &'a str,
}

/// Result of a successful phase action.
#[derive(Debug, Default)]
pub struct PhaseResult {
    /// Instances the action completed, in batch order. These are the ones to
    /// checkpoint with the next phase.
    pub completed: Vec<Instance>,
    /// Instances moved straight to another phase by the action itself.
    pub diverted: usize,
}

/// Runs the action for `phase` over the whole batch. The first failure
/// aborts the phase.
pub async fn execute(phase: Phase, batch: Vec<Instance>, ctx: &PhaseContext<'_>) -> Result<PhaseResult> {
    info!(
        phase = %phase,
        batch_size = batch.len(),
        "Executing lifecycle phase"
    );

    match phase {
        Phase::Detach => detach::run(ctx, batch).await,
        Phase::Drain => drain::run(ctx.drainer, batch).await,
        Phase::Terminate => terminate::run(ctx.compute, batch).await,
    }
}
