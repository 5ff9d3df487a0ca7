//! Error types for the lending simulation.

use std::fmt;

use thiserror::Error;

use crate::types::{AgentId, Day};

/// The step of the daily protocol in which a per-agent fault occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPhase {
    Advance,
}

impl fmt::Display for FaultPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultPhase::Advance => write!(f, "advance"),
        }
    }
}

/// A fault confined to one agent. Never fatal to the run.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("agent {agent_id} faulted during {phase}: {reason}")]
pub struct AgentFault {
    pub agent_id: AgentId,
    pub phase: FaultPhase,
    pub reason: String,
}

/// A day's policy could not be used for settlement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// The source produced no policy at all.
    #[error("no policy supplied")]
    Missing,

    /// The policy object lacks one of its required fields.
    #[error("policy is missing required field `{0}`")]
    MissingField(&'static str),

    /// The policy payload could not be parsed.
    #[error("malformed policy: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("interest rate must be finite and non-negative, got {0}")]
    InterestRate(f64),
}

/// Top-level error for driving a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("settlement for day {day} skipped: {source}")]
    Policy {
        day: Day,
        #[source]
        source: PolicyError,
    },

    #[error("invalid policy input: {0}")]
    PolicyInput(#[from] PolicyError),

    #[error("no advanced day awaiting settlement")]
    NothingToSettle,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub fn policy(day: Day, source: PolicyError) -> Self {
        Self::Policy { day, source }
    }
}
