//! Underwriting policy and its validation boundary.
//!
//! Policies arrive from outside the core as loosely-typed JSON. They are
//! parsed into a [`RawPolicy`] with every field optional, then checked into a
//! [`Policy`]. Only a `Policy` ever reaches settlement.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, Personality};
use crate::error::PolicyError;

/// One day's underwriting rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub min_credit_score: u32,
    pub min_income: u32,
    /// Personalities refused regardless of score and income.
    pub deny_if_personality: BTreeSet<Personality>,
    /// Rationale from whoever authored the policy. Not used in decisions.
    pub reason: String,
}

/// A policy as received, before its required fields are checked.
///
/// Thresholds must be non-negative JSON integers. A negative number or a
/// float such as `650.0` fails to parse and is reported as malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawPolicy {
    pub min_credit_score: Option<u32>,
    pub min_income: Option<u32>,
    pub deny_if_personality: Option<BTreeSet<Personality>>,
    pub reason: Option<String>,
}

impl TryFrom<RawPolicy> for Policy {
    type Error = PolicyError;

    fn try_from(raw: RawPolicy) -> Result<Self, Self::Error> {
        Ok(Policy {
            min_credit_score: raw
                .min_credit_score
                .ok_or(PolicyError::MissingField("min_credit_score"))?,
            min_income: raw.min_income.ok_or(PolicyError::MissingField("min_income"))?,
            deny_if_personality: raw
                .deny_if_personality
                .ok_or(PolicyError::MissingField("deny_if_personality"))?,
            reason: raw.reason.ok_or(PolicyError::MissingField("reason"))?,
        })
    }
}

impl Policy {
    /// The reference policy used when no other source is configured.
    pub fn canonical() -> Self {
        Policy {
            min_credit_score: 650,
            min_income: 4_000,
            deny_if_personality: BTreeSet::from([Personality::Impulsive]),
            reason: "Default risk is high due to current macro conditions.".to_string(),
        }
    }

    /// Parse and validate a JSON policy. `null` is a missing policy; a
    /// payload that is not a policy object is malformed.
    pub fn from_json(text: &str) -> Result<Self, PolicyError> {
        let raw: Option<RawPolicy> =
            serde_json::from_str(text).map_err(|e| PolicyError::Malformed(e.to_string()))?;
        raw.ok_or(PolicyError::Missing)?.try_into()
    }

    /// Whether an applicant with this profile is approved.
    pub fn approves(&self, agent: &Agent) -> bool {
        agent.credit_score() >= self.min_credit_score
            && agent.income() >= self.min_income
            && !self.deny_if_personality.contains(&agent.personality())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentId;

    fn applicant(income: u32, credit_score: u32, personality: Personality) -> Agent {
        Agent::with_profile(AgentId(0), income, credit_score, personality)
    }

    fn open_policy(min_credit_score: u32, min_income: u32) -> Policy {
        Policy {
            min_credit_score,
            min_income,
            deny_if_personality: BTreeSet::new(),
            reason: String::new(),
        }
    }

    // ── Decision rule ─────────────────────────────────────────────────────────

    #[test]
    fn thresholds_are_inclusive() {
        let policy = open_policy(650, 4_000);
        assert!(policy.approves(&applicant(4_000, 650, Personality::Moderate)));
        assert!(!policy.approves(&applicant(3_999, 650, Personality::Moderate)));
        assert!(!policy.approves(&applicant(4_000, 649, Personality::Moderate)));
    }

    #[test]
    fn denied_personality_overrides_strong_profile() {
        let policy = Policy::canonical();
        assert!(!policy.approves(&applicant(10_000, 800, Personality::Impulsive)));
        assert!(policy.approves(&applicant(10_000, 800, Personality::Disciplined)));
    }

    #[test]
    fn empty_deny_set_excludes_nobody() {
        let policy = open_policy(0, 0);
        for p in Personality::ALL {
            assert!(policy.approves(&applicant(2_000, 500, p)), "{p} should be approved");
        }
    }

    // ── Boundary validation ───────────────────────────────────────────────────

    #[test]
    fn full_json_policy_parses() {
        let policy = Policy::from_json(
            r#"{"min_credit_score": 650, "min_income": 4000,
                "deny_if_personality": ["impulsive"], "reason": "tight"}"#,
        )
        .unwrap();
        assert_eq!(policy.min_credit_score, 650);
        assert_eq!(policy.min_income, 4_000);
        assert!(policy.deny_if_personality.contains(&Personality::Impulsive));
        assert_eq!(policy.reason, "tight");
    }

    #[test]
    fn null_policy_is_missing() {
        assert_eq!(Policy::from_json("null"), Err(PolicyError::Missing));
    }

    #[test]
    fn absent_threshold_is_missing_field() {
        let err = Policy::from_json(
            r#"{"min_income": 4000, "deny_if_personality": [], "reason": ""}"#,
        )
        .unwrap_err();
        assert_eq!(err, PolicyError::MissingField("min_credit_score"));
    }

    #[test]
    fn absent_deny_list_is_missing_field() {
        let err =
            Policy::from_json(r#"{"min_credit_score": 650, "min_income": 4000, "reason": ""}"#)
                .unwrap_err();
        assert_eq!(err, PolicyError::MissingField("deny_if_personality"));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            Policy::from_json("approve everyone"),
            Err(PolicyError::Malformed(_))
        ));
    }

    #[test]
    fn wrong_field_type_is_malformed() {
        assert!(matches!(
            Policy::from_json(
                r#"{"min_credit_score": "high", "min_income": 4000,
                    "deny_if_personality": [], "reason": ""}"#
            ),
            Err(PolicyError::Malformed(_))
        ));
    }

    #[test]
    fn float_or_negative_threshold_is_malformed() {
        for score in ["650.0", "-1"] {
            let json = format!(
                r#"{{"min_credit_score": {score}, "min_income": 4000,
                    "deny_if_personality": [], "reason": ""}}"#
            );
            assert!(
                matches!(Policy::from_json(&json), Err(PolicyError::Malformed(_))),
                "threshold {score}"
            );
        }
    }

    #[test]
    fn unknown_personality_is_malformed() {
        assert!(matches!(
            Policy::from_json(
                r#"{"min_credit_score": 650, "min_income": 4000,
                    "deny_if_personality": ["reckless"], "reason": ""}"#
            ),
            Err(PolicyError::Malformed(_))
        ));
    }

    #[test]
    fn serialized_policy_reads_back() {
        let json = serde_json::to_string(&Policy::canonical()).unwrap();
        assert_eq!(Policy::from_json(&json).unwrap(), Policy::canonical());
    }
}
