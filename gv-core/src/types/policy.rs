//! Decision policies
//!
//! A decision policy maps a tally, the group's total weight and the elapsed
//! voting time to `{allow, final}`. `final` means no later vote can change
//! `allow`, so the proposal must be closed now.

use chrono::Duration as ChronoDuration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::decimal::{checked_add, checked_difference, parse_positive};
use super::group::GroupInfo;
use super::tally::Tally;
use crate::error::{GovError, GovResult};

/// Outcome of a policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPolicyResult {
    pub allow: bool,
    #[serde(rename = "final")]
    pub is_final: bool,
}

impl DecisionPolicyResult {
    pub const OPEN: Self = Self { allow: false, is_final: false };
    pub const ACCEPT: Self = Self { allow: true, is_final: true };
    pub const REJECT: Self = Self { allow: false, is_final: true };
}

/// Contract every policy variant implements
pub trait PolicyEvaluator {
    /// Evaluate the tally after `voting_duration` has elapsed since submission
    fn allow(
        &self,
        tally: &Tally,
        total_weight: Decimal,
        voting_duration: ChronoDuration,
    ) -> GovResult<DecisionPolicyResult>;

    /// Check the policy can be bound to `group`
    fn validate(&self, group: &GroupInfo) -> GovResult<()>;

    /// Voting window length
    fn timeout(&self) -> ChronoDuration;
}

/// Passes once YES weight reaches `threshold` within `timeout`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdPolicy {
    pub threshold: Decimal,
    pub timeout: Duration,
}

impl ThresholdPolicy {
    pub fn new(threshold: &str, timeout: Duration) -> GovResult<Self> {
        let policy = Self {
            threshold: parse_positive(threshold)?,
            timeout,
        };
        policy.validate_basic()?;
        Ok(policy)
    }

    /// Stateless checks: positive threshold and timeout
    pub fn validate_basic(&self) -> GovResult<()> {
        if self.threshold <= Decimal::ZERO {
            return Err(GovError::InvalidArgument(format!(
                "threshold must be positive, got {}",
                self.threshold
            )));
        }
        if self.timeout.is_zero() {
            return Err(GovError::InvalidArgument(
                "timeout must be positive".to_string(),
            ));
        }
        ChronoDuration::from_std(self.timeout)
            .map_err(|e| GovError::InvalidArgument(format!("timeout out of range: {}", e)))?;
        Ok(())
    }
}

impl PolicyEvaluator for ThresholdPolicy {
    fn allow(
        &self,
        tally: &Tally,
        total_weight: Decimal,
        voting_duration: ChronoDuration,
    ) -> GovResult<DecisionPolicyResult> {
        if voting_duration >= self.timeout() {
            return Ok(DecisionPolicyResult::REJECT);
        }

        let total_counts = tally.total_counts()?;
        let undecided = checked_difference(total_weight, total_counts)?.max(Decimal::ZERO);

        if tally.yes_count >= self.threshold {
            return Ok(DecisionPolicyResult::ACCEPT);
        }

        let reachable = checked_add(tally.yes_count, undecided)?;
        if reachable < self.threshold {
            return Ok(DecisionPolicyResult::REJECT);
        }

        Ok(DecisionPolicyResult::OPEN)
    }

    fn validate(&self, group: &GroupInfo) -> GovResult<()> {
        self.validate_basic()?;
        if self.threshold > group.total_weight {
            return Err(GovError::InsufficientWeight {
                threshold: self.threshold.to_string(),
                total_weight: group.total_weight.to_string(),
            });
        }
        Ok(())
    }

    fn timeout(&self) -> ChronoDuration {
        ChronoDuration::from_std(self.timeout).unwrap_or(ChronoDuration::MAX)
    }
}

/// Tagged policy variant stored on a group account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionPolicy {
    Threshold(ThresholdPolicy),
}

impl DecisionPolicy {
    pub fn threshold(threshold: &str, timeout: Duration) -> GovResult<Self> {
        Ok(Self::Threshold(ThresholdPolicy::new(threshold, timeout)?))
    }

    pub fn validate_basic(&self) -> GovResult<()> {
        match self {
            Self::Threshold(p) => p.validate_basic(),
        }
    }

    fn evaluator(&self) -> &dyn PolicyEvaluator {
        match self {
            Self::Threshold(p) => p,
        }
    }
}

impl PolicyEvaluator for DecisionPolicy {
    fn allow(
        &self,
        tally: &Tally,
        total_weight: Decimal,
        voting_duration: ChronoDuration,
    ) -> GovResult<DecisionPolicyResult> {
        self.evaluator().allow(tally, total_weight, voting_duration)
    }

    fn validate(&self, group: &GroupInfo) -> GovResult<()> {
        self.evaluator().validate(group)
    }

    fn timeout(&self) -> ChronoDuration {
        self.evaluator().timeout()
    }
}
