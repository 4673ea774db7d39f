use serde::Serialize;
use std::fmt;

/// Lifecycle of one pipeline run. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    NotStarted,
    /// Deciding which modules are eligible and ready
    Selecting,
    /// Running ready modules in registration order
    Executing,
    Done,
}

impl RunPhase {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::NotStarted => Some(Self::Selecting),
            Self::Selecting => Some(Self::Executing),
            Self::Executing => Some(Self::Done),
            Self::Done => None,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Selecting => write!(f, "selecting"),
            Self::Executing => write!(f, "executing"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Tracks the phase of a run and the trail of phases it went through.
#[derive(Debug)]
pub(crate) struct RunState {
    phase: RunPhase,
    trail: Vec<RunPhase>,
}

impl RunState {
    pub(crate) fn new() -> Self {
        Self {
            phase: RunPhase::NotStarted,
            trail: vec![RunPhase::NotStarted],
        }
    }

    /// Moves to the following phase; a no-op once done.
    pub(crate) fn advance(&mut self) -> RunPhase {
        if let Some(next) = self.phase.next() {
            tracing::debug!(from = %self.phase, to = %next, "run phase");
            self.phase = next;
            self.trail.push(next);
        }
        self.phase
    }

    pub(crate) fn phase(&self) -> RunPhase {
        self.phase
    }

    pub(crate) fn into_trail(self) -> Vec<RunPhase> {
        self.trail
    }
}
