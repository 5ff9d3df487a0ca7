use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::policy::Policy;
use crate::population::{Population, StepReport};
use crate::report::DayRecord;
use crate::settlement::settle;
use crate::source::{BankData, PolicySource};
use crate::types::Day;

/// What `Simulation::run` does when a day's policy cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMissingPolicy {
    /// Stop the run and return the policy error.
    Abort,
    /// Leave the day unsettled and carry on with the next one.
    Skip,
}

/// One seeded run: a population, its random stream, and the day records
/// produced so far.
pub struct Simulation {
    population: Population,
    rng: ChaCha20Rng,
    /// Settled days in order.
    pub log: Vec<DayRecord>,
    /// Days that were advanced but never settled.
    pub skipped: Vec<Day>,
    /// The advanced day still waiting for a policy.
    pending: Option<Day>,
    config: SimulationConfig,
}

impl Simulation {
    pub fn from_config(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        let population = Population::new(config.n_agents, config.interest_rate, &mut rng);
        Ok(Simulation {
            population,
            rng,
            log: Vec::new(),
            skipped: Vec::new(),
            pending: None,
            config,
        })
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn bank_data(&self) -> BankData {
        BankData::observe(&self.population)
    }

    /// First phase of a day: every agent rolls its application and, for live
    /// loans, its default. A previously advanced day that was never settled
    /// is recorded as skipped.
    pub fn advance_day(&mut self) -> StepReport {
        if let Some(day) = self.pending.take() {
            warn!(day = day.0, "advancing past an unsettled day");
            self.skipped.push(day);
        }
        let report = self.population.step(&mut self.rng);
        self.pending = Some(report.day);
        report
    }

    /// Second phase: settle the advanced day with `policy`. Also the way to
    /// retry a day whose policy source failed.
    pub fn settle_day(&mut self, policy: &Policy) -> Result<DayRecord, SimError> {
        let day = self.pending.take().ok_or(SimError::NothingToSettle)?;
        let applied_count = self.population.applied_count();
        let outcome = settle(&mut self.population, policy);
        let record = DayRecord {
            day,
            applied_count,
            approved_count: outcome.approved,
            default_count: outcome.defaults,
            total_approved_to_date: self.population.approved_count(),
            total_defaulted_to_date: self.population.defaulted_count(),
        };
        info!(
            day = day.0,
            applied = record.applied_count,
            approved = record.approved_count,
            defaults = record.default_count,
            "day settled"
        );
        self.log.push(record);
        Ok(record)
    }

    /// Advance one day and settle it with the source's policy. On a policy
    /// error the day stays pending so the caller may retry with
    /// `settle_day`; agents keep their previous approvals.
    pub fn run_day<S>(&mut self, source: &mut S) -> Result<DayRecord, SimError>
    where
        S: PolicySource + ?Sized,
    {
        let report = self.advance_day();
        let data = self.bank_data();
        match source.daily_policy(report.day, &data) {
            Ok(policy) => self.settle_day(&policy),
            Err(e) => {
                warn!(day = report.day.0, error = %e, "settlement skipped");
                Err(SimError::policy(report.day, e))
            }
        }
    }

    /// Run the configured number of days.
    pub fn run<S>(&mut self, source: &mut S, on_missing: OnMissingPolicy) -> Result<(), SimError>
    where
        S: PolicySource + ?Sized,
    {
        for _ in 0..self.config.days {
            match self.run_day(source) {
                Ok(_) => {}
                Err(SimError::Policy { day, .. }) if on_missing == OnMissingPolicy::Skip => {
                    self.pending = None;
                    self.skipped.push(day);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
