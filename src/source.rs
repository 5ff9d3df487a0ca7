//! Where daily policies come from.
//!
//! The simulation hands a [`PolicySource`] a snapshot of the bank's book each
//! day and settles with whatever policy comes back. How the policy is
//! authored (a fixed rule table, a scripted schedule, a human, a model) is
//! the source's business.

use std::collections::BTreeMap;
use std::io::BufRead;

use serde::Serialize;

use crate::agent::Personality;
use crate::error::{PolicyError, SimError};
use crate::policy::Policy;
use crate::population::Population;
use crate::types::Day;

/// Aggregate bank statistics offered to a policy author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankData {
    pub interest_rate: f64,
    /// Non-performing assets: defaulted agents as a percentage of approved
    /// agents. Zero when nobody holds an approval.
    pub npa_rate: f64,
    pub avg_income: f64,
    /// Fraction of each personality group currently in default.
    pub personality_risk: BTreeMap<Personality, f64>,
}

impl BankData {
    pub fn observe(population: &Population) -> Self {
        let approved = population.approved_count();
        let npa_rate = if approved == 0 {
            0.0
        } else {
            population.defaulted_count() as f64 / approved as f64 * 100.0
        };

        let avg_income = if population.is_empty() {
            0.0
        } else {
            population.agents().iter().map(|a| a.income() as f64).sum::<f64>()
                / population.len() as f64
        };

        let mut personality_risk = BTreeMap::new();
        for p in Personality::ALL {
            let (members, defaulted) = population
                .agents()
                .iter()
                .filter(|a| a.personality() == p)
                .fold((0u32, 0u32), |(n, d), a| (n + 1, d + a.defaulted() as u32));
            let risk = if members == 0 { 0.0 } else { defaulted as f64 / members as f64 };
            personality_risk.insert(p, risk);
        }

        BankData { interest_rate: population.interest_rate(), npa_rate, avg_income, personality_risk }
    }
}

pub trait PolicySource {
    /// Produce the policy for `day`. An error skips that day's settlement.
    fn daily_policy(&mut self, day: Day, data: &BankData) -> Result<Policy, PolicyError>;
}

/// The same policy every day.
#[derive(Debug, Clone)]
pub struct StaticPolicy(pub Policy);

impl PolicySource for StaticPolicy {
    fn daily_policy(&mut self, _day: Day, _data: &BankData) -> Result<Policy, PolicyError> {
        Ok(self.0.clone())
    }
}

/// One pre-validated entry per day, starting at `Day(1)`. Days past the end
/// of the schedule have no policy.
#[derive(Debug, Clone, Default)]
pub struct PolicySchedule {
    entries: Vec<Result<Policy, PolicyError>>,
}

impl PolicySchedule {
    pub fn new(entries: Vec<Result<Policy, PolicyError>>) -> Self {
        PolicySchedule { entries }
    }

    /// Read an NDJSON schedule: one policy object (or `null`) per line.
    /// Bad lines become errors for their day rather than failing the load.
    pub fn from_ndjson(reader: impl BufRead) -> Result<Self, SimError> {
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(Policy::from_json(&line));
        }
        Ok(PolicySchedule { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PolicySource for PolicySchedule {
    fn daily_policy(&mut self, day: Day, _data: &BankData) -> Result<Policy, PolicyError> {
        let idx = day.0.checked_sub(1).ok_or(PolicyError::Missing)? as usize;
        self.entries.get(idx).cloned().unwrap_or(Err(PolicyError::Missing))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::agent::Agent;
    use crate::types::AgentId;

    fn empty_data() -> BankData {
        BankData::observe(&Population::from_agents(Vec::new(), 8.5))
    }

    #[test]
    fn observe_empty_population_is_all_zero() {
        let data = empty_data();
        assert_eq!(data.interest_rate, 8.5);
        assert_eq!(data.npa_rate, 0.0);
        assert_eq!(data.avg_income, 0.0);
        assert!(data.personality_risk.values().all(|&r| r == 0.0));
        assert_eq!(data.personality_risk.len(), 3);
    }

    #[test]
    fn observe_averages_income() {
        let agents = vec![
            Agent::with_profile(AgentId(0), 2_000, 600, Personality::Moderate),
            Agent::with_profile(AgentId(1), 6_000, 600, Personality::Moderate),
        ];
        let data = BankData::observe(&Population::from_agents(agents, 8.5));
        assert_eq!(data.avg_income, 4_000.0);
    }

    #[test]
    fn observe_npa_and_personality_risk_after_defaults() {
        let mut agents = vec![
            Agent::with_profile(AgentId(0), 5_000, 700, Personality::Impulsive),
            Agent::with_profile(AgentId(1), 5_000, 700, Personality::Impulsive),
            Agent::with_profile(AgentId(2), 5_000, 700, Personality::Moderate),
            Agent::with_profile(AgentId(3), 5_000, 700, Personality::Disciplined),
        ];
        // Only agent 0 holds a loan during the step; at 100% its risk is 1.0.
        agents[0].approved = true;
        let mut pop = Population::from_agents(agents, 100.0);
        let report = pop.step(&mut ChaCha20Rng::seed_from_u64(11));
        assert!(report.faults.is_empty());

        for agent in &mut pop.agents_mut()[2..] {
            agent.approved = true;
        }
        let data = BankData::observe(&pop);

        // 1 defaulted out of 3 approved.
        assert!((data.npa_rate - 100.0 / 3.0).abs() < 1e-9, "npa {}", data.npa_rate);
        assert_eq!(data.personality_risk[&Personality::Impulsive], 0.5);
        assert_eq!(data.personality_risk[&Personality::Moderate], 0.0);
        assert_eq!(data.personality_risk[&Personality::Disciplined], 0.0);
        assert_eq!(data.interest_rate, 100.0);
    }

    #[test]
    fn bank_data_json_uses_personality_keys() {
        let value = serde_json::to_value(empty_data()).unwrap();
        assert!(value["personality_risk"].get("impulsive").is_some());
        assert!(value.get("npa_rate").is_some());
    }

    #[test]
    fn static_policy_repeats() {
        let mut source = StaticPolicy(Policy::canonical());
        let data = empty_data();
        for d in 1..=5 {
            assert_eq!(source.daily_policy(Day(d), &data).unwrap(), Policy::canonical());
        }
    }

    #[test]
    fn schedule_reads_one_policy_per_line() {
        let text = concat!(
            r#"{"min_credit_score": 600, "min_income": 3000, "deny_if_personality": [], "reason": "loose"}"#,
            "\n",
            "null\n",
            "\n",
            r#"{"min_income": 3000, "deny_if_personality": [], "reason": "broken"}"#,
            "\n",
        );
        let mut schedule = PolicySchedule::from_ndjson(text.as_bytes()).unwrap();
        assert_eq!(schedule.len(), 3);

        let data = empty_data();
        assert_eq!(schedule.daily_policy(Day(1), &data).unwrap().min_credit_score, 600);
        assert_eq!(schedule.daily_policy(Day(2), &data), Err(PolicyError::Missing));
        assert_eq!(
            schedule.daily_policy(Day(3), &data),
            Err(PolicyError::MissingField("min_credit_score"))
        );
        assert_eq!(schedule.daily_policy(Day(4), &data), Err(PolicyError::Missing));
    }

    #[test]
    fn schedule_has_nothing_for_day_zero() {
        let mut schedule = PolicySchedule::new(vec![Ok(Policy::canonical())]);
        assert_eq!(schedule.daily_policy(Day(0), &empty_data()), Err(PolicyError::Missing));
    }
}
