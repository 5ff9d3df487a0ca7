use crate::policy::Policy;
use crate::population::Population;

/// Aggregates from one settlement call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settlement {
    /// Applicants approved by this call.
    pub approved: u32,
    /// Agents in default at the time of the call, whether or not they applied.
    pub defaults: u32,
}

/// Apply `policy` to today's applicants.
///
/// Every agent that applied today has `approved` recomputed from scratch, so
/// an earlier approval can be withdrawn. Agents that did not apply keep
/// their previous decision.
pub fn settle(population: &mut Population, policy: &Policy) -> Settlement {
    let mut out = Settlement::default();
    for agent in population.agents_mut() {
        if agent.applied_today {
            agent.approved = policy.approves(agent);
            if agent.approved {
                out.approved += 1;
            }
        }
        if agent.defaulted() {
            out.defaults += 1;
        }
    }
    out
}
