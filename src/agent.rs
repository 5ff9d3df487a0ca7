use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{APPLY_PROBABILITY, BASE_DEFAULT_RISK, CREDIT_SCORE_RANGE, INCOME_RANGE};
use crate::error::{AgentFault, FaultPhase};
use crate::types::AgentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Disciplined,
    Moderate,
    Impulsive,
}

impl Personality {
    pub const ALL: [Personality; 3] =
        [Personality::Disciplined, Personality::Moderate, Personality::Impulsive];

    /// Scales the base default risk for this borrower type.
    pub fn risk_multiplier(self) -> f64 {
        match self {
            Personality::Disciplined => 0.5,
            Personality::Moderate => 1.0,
            Personality::Impulsive => 2.0,
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Personality::Disciplined => "disciplined",
            Personality::Moderate => "moderate",
            Personality::Impulsive => "impulsive",
        };
        f.pad(name)
    }
}

/// Daily probability that an approved borrower defaults.
///
/// `interest_rate` is in raw percentage points (8.5, not 0.085) and is not
/// normalised by 100.
pub fn default_risk(interest_rate: f64, personality: Personality) -> f64 {
    let base = BASE_DEFAULT_RISK * interest_rate / 10.0;
    base * personality.risk_multiplier()
}

/// One citizen. Demographics are fixed at creation; the three flags carry
/// day-to-day lending state.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    id: AgentId,
    income: u32,
    credit_score: u32,
    personality: Personality,
    pub(crate) applied_today: bool,
    pub(crate) approved: bool,
    defaulted: bool,
}

impl Agent {
    /// Draw a fresh citizen: income, then credit score, then personality.
    pub fn random(id: AgentId, rng: &mut impl Rng) -> Self {
        let income = rng.random_range(INCOME_RANGE);
        let credit_score = rng.random_range(CREDIT_SCORE_RANGE);
        let personality = Personality::ALL[rng.random_range(0..Personality::ALL.len())];
        Agent::with_profile(id, income, credit_score, personality)
    }

    /// A citizen with known demographics and no lending history.
    pub fn with_profile(
        id: AgentId,
        income: u32,
        credit_score: u32,
        personality: Personality,
    ) -> Self {
        Agent {
            id,
            income,
            credit_score,
            personality,
            applied_today: false,
            approved: false,
            defaulted: false,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn income(&self) -> u32 {
        self.income
    }

    pub fn credit_score(&self) -> u32 {
        self.credit_score
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    pub fn applied_today(&self) -> bool {
        self.applied_today
    }

    pub fn approved(&self) -> bool {
        self.approved
    }

    pub fn defaulted(&self) -> bool {
        self.defaulted
    }

    /// Roll one simulated day: the application draw, then (for a live
    /// approved loan) the default draw. Both draws come from `rng` in that
    /// order.
    ///
    /// A default risk that is not a finite number is reported as a fault;
    /// the agent keeps its application roll and is left undefaulted.
    pub fn advance(&mut self, interest_rate: f64, rng: &mut impl Rng) -> Result<(), AgentFault> {
        self.applied_today = rng.random::<f64>() < APPLY_PROBABILITY;

        if !self.approved || self.defaulted {
            return Ok(());
        }

        let risk = default_risk(interest_rate, self.personality);
        if !risk.is_finite() {
            return Err(AgentFault {
                agent_id: self.id,
                phase: FaultPhase::Advance,
                reason: format!("default risk {risk} from interest rate {interest_rate}"),
            });
        }
        if rng.random::<f64>() < risk {
            self.defaulted = true;
        }
        Ok(())
    }
}
