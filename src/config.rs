//! Planner configuration.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.
//!
//! ```
//! use u_courseplan::config::{CreditPolicy, PlannerConfig};
//!
//! let config = PlannerConfig::from_json_str(r#"{ "credit_policy": "capped" }"#).unwrap();
//! assert_eq!(config.credit_policy, CreditPolicy::Capped);
//! assert_eq!(config.max_idle_terms, 4);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::expand::DEFAULT_MAX_ROUNDS;

/// How the per-term credit cap is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditPolicy {
    /// Every eligible course is placed; the cap is only reported.
    #[default]
    Uncapped,
    /// Eligible courses are taken in code order while the term stays within
    /// the student's `credits_per_semester`.
    Capped,
}

/// How CONCURRENT / CONCURRENT_OR_COMPLETED prerequisite leaves are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// Every course leaf is a strict-ordering edge; concurrent leaves are
    /// also recorded in the concurrent relation.
    #[default]
    Conservative,
    /// Concurrent leaves only require the partner in the same term or earlier.
    SameTerm,
}

/// Foundational buckets and the credit hours each needs.
pub const DEFAULT_TAG_REQUIREMENTS: [(&str, f64); 16] = [
    ("FWS", 3.0),
    ("FAW", 3.0),
    ("FQR", 3.0),
    ("FIE", 2.0),
    ("PHTC", 3.0),
    ("PHA", 3.0),
    ("PNS", 3.0),
    ("PSBS", 3.0),
    ("ACSW", 3.0),
    ("ANW", 3.0),
    ("ACNW", 3.0),
    ("BSL", 1.0),
    ("BER", 1.0),
    ("BDP", 1.0),
    ("BLD", 1.0),
    ("CAP", 2.0),
];

/// Options for a planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Credit-cap policy.
    pub credit_policy: CreditPolicy,
    /// Concurrent-prerequisite policy.
    pub concurrency: ConcurrencyPolicy,
    /// Bound on required-course expansion rounds.
    pub max_expansion_rounds: usize,
    /// Consecutive terms without progress before the scheduler gives up.
    pub max_idle_terms: usize,
    /// Bucket code → credit hours required, for the tag tally.
    pub tag_requirements: BTreeMap<String, f64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            credit_policy: CreditPolicy::default(),
            concurrency: ConcurrencyPolicy::default(),
            max_expansion_rounds: DEFAULT_MAX_ROUNDS,
            max_idle_terms: 4,
            tag_requirements: DEFAULT_TAG_REQUIREMENTS
                .iter()
                .map(|(code, credits)| (code.to_string(), *credits))
                .collect(),
        }
    }
}

impl PlannerConfig {
    /// Parses a (possibly partial) JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the credit-cap policy.
    pub fn with_credit_policy(mut self, policy: CreditPolicy) -> Self {
        self.credit_policy = policy;
        self
    }

    /// Sets the concurrent-prerequisite policy.
    pub fn with_concurrency(mut self, policy: ConcurrencyPolicy) -> Self {
        self.concurrency = policy;
        self
    }

    /// Sets the expansion round bound.
    pub fn with_max_expansion_rounds(mut self, rounds: usize) -> Self {
        self.max_expansion_rounds = rounds;
        self
    }

    /// Sets how many idle terms the scheduler tolerates.
    pub fn with_max_idle_terms(mut self, terms: usize) -> Self {
        self.max_idle_terms = terms;
        self
    }

    /// Replaces the tag buckets.
    pub fn with_tag_requirements(mut self, buckets: BTreeMap<String, f64>) -> Self {
        self.tag_requirements = buckets;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.credit_policy, CreditPolicy::Uncapped);
        assert_eq!(config.concurrency, ConcurrencyPolicy::Conservative);
        assert_eq!(config.max_expansion_rounds, 256);
        assert_eq!(config.tag_requirements.len(), 16);
        assert_eq!(config.tag_requirements["FIE"], 2.0);
    }

    #[test]
    fn test_partial_json() {
        let config = PlannerConfig::from_json_str(
            r#"{ "concurrency": "same_term", "max_idle_terms": 2, "tag_requirements": { "FWS": 3 } }"#,
        )
        .unwrap();
        assert_eq!(config.concurrency, ConcurrencyPolicy::SameTerm);
        assert_eq!(config.credit_policy, CreditPolicy::Uncapped);
        assert_eq!(config.max_idle_terms, 2);
        assert_eq!(config.tag_requirements.len(), 1);

        assert_eq!(PlannerConfig::from_json_str("{}").unwrap(), PlannerConfig::default());
    }

    #[test]
    fn test_bad_json() {
        let err = PlannerConfig::from_json_str(r#"{ "credit_policy": "sometimes" }"#).unwrap_err();
        assert!(matches!(err, PlanError::Json(_)));
    }

    #[test]
    fn test_builders() {
        let config = PlannerConfig::default()
            .with_credit_policy(CreditPolicy::Capped)
            .with_concurrency(ConcurrencyPolicy::SameTerm)
            .with_max_expansion_rounds(8)
            .with_max_idle_terms(1)
            .with_tag_requirements(BTreeMap::new());
        assert_eq!(config.credit_policy, CreditPolicy::Capped);
        assert_eq!(config.max_expansion_rounds, 8);
        assert!(config.tag_requirements.is_empty());
    }
}
