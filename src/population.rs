use rand::Rng;
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::error::AgentFault;
use crate::types::{AgentId, Day};

/// Outcome of one `Population::step`: the new day and any agents whose
/// advance faulted. Faulted agents are skipped, never the whole day.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub day: Day,
    pub faults: Vec<AgentFault>,
}

/// The city: a fixed, ordered set of citizens sharing one interest rate.
#[derive(Debug, Clone)]
pub struct Population {
    interest_rate: f64,
    agents: Vec<Agent>,
    day: Day,
}

impl Population {
    /// Create `n_agents` citizens with ids `0..n_agents`, drawn in id order.
    pub fn new(n_agents: usize, interest_rate: f64, rng: &mut impl Rng) -> Self {
        let agents = (0..n_agents as u64).map(|i| Agent::random(AgentId(i), rng)).collect();
        Population::from_agents(agents, interest_rate)
    }

    /// Wrap pre-built agents. The interest rate is taken as given.
    pub fn from_agents(agents: Vec<Agent>, interest_rate: f64) -> Self {
        Population { interest_rate, agents, day: Day(0) }
    }

    pub fn interest_rate(&self) -> f64 {
        self.interest_rate
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub(crate) fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn applied_count(&self) -> u32 {
        self.agents.iter().filter(|a| a.applied_today()).count() as u32
    }

    pub fn approved_count(&self) -> u32 {
        self.agents.iter().filter(|a| a.approved()).count() as u32
    }

    pub fn defaulted_count(&self) -> u32 {
        self.agents.iter().filter(|a| a.defaulted()).count() as u32
    }

    /// Advance the city by one day. The day counter moves first, then every
    /// agent is advanced in collection order from the shared `rng`.
    pub fn step(&mut self, rng: &mut impl Rng) -> StepReport {
        self.day = self.day.next();

        let mut faults = Vec::new();
        for agent in &mut self.agents {
            if let Err(fault) = agent.advance(self.interest_rate, rng) {
                warn!(
                    day = self.day.0,
                    agent_id = fault.agent_id.0,
                    phase = %fault.phase,
                    "{}",
                    fault.reason
                );
                faults.push(fault);
            }
        }

        debug!(day = self.day.0, agents = self.agents.len(), faults = faults.len(), "population advanced");
        StepReport { day: self.day, faults }
    }
}
