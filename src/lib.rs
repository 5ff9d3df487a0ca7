//! Agent-based loan underwriting simulation.
//!
//! A city of citizens rolls loan applications and defaults each day; a
//! policy supplied from outside the core decides which applicants are
//! approved. Runs are reproducible from a single seed.

pub mod agent;
pub mod config;
pub mod error;
pub mod policy;
pub mod population;
pub mod report;
pub mod settlement;
pub mod simulation;
pub mod source;
pub mod types;

pub use error::{AgentFault, ConfigError, FaultPhase, PolicyError, SimError};
pub use policy::{Policy, RawPolicy};
pub use simulation::{OnMissingPolicy, Simulation};
