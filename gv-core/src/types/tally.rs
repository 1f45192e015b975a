//! Weighted vote tally

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::decimal::{checked_add, checked_sub};
use super::vote::Choice;
use crate::error::{GovError, GovResult};

/// Sum of member weights per choice
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tally {
    pub yes_count: Decimal,
    pub no_count: Decimal,
    pub abstain_count: Decimal,
    pub veto_count: Decimal,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, choice: Choice) -> GovResult<&mut Decimal> {
        match choice {
            Choice::Yes => Ok(&mut self.yes_count),
            Choice::No => Ok(&mut self.no_count),
            Choice::Abstain => Ok(&mut self.abstain_count),
            Choice::Veto => Ok(&mut self.veto_count),
            Choice::Unspecified => Err(GovError::InvalidArgument(
                "cannot tally an unspecified choice".to_string(),
            )),
        }
    }

    fn check_weight(weight: Decimal) -> GovResult<()> {
        if weight <= Decimal::ZERO {
            return Err(GovError::InvalidArgument(format!(
                "vote weight must be positive, got {}",
                weight
            )));
        }
        Ok(())
    }

    /// Add `weight` to the counter for `choice`
    pub fn add(&mut self, choice: Choice, weight: Decimal) -> GovResult<()> {
        Self::check_weight(weight)?;
        let slot = self.slot(choice)?;
        *slot = checked_add(*slot, weight)?;
        Ok(())
    }

    /// Remove `weight` from the counter for `choice`
    pub fn sub(&mut self, choice: Choice, weight: Decimal) -> GovResult<()> {
        Self::check_weight(weight)?;
        let slot = self.slot(choice)?;
        *slot = checked_sub(*slot, weight)?;
        Ok(())
    }

    /// Total weight that has voted
    pub fn total_counts(&self) -> GovResult<Decimal> {
        let mut total = checked_add(self.yes_count, self.no_count)?;
        total = checked_add(total, self.abstain_count)?;
        checked_add(total, self.veto_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_add_and_total() {
        let mut t = Tally::new();
        t.add(Choice::Yes, d("1")).unwrap();
        t.add(Choice::Yes, d("2.5")).unwrap();
        t.add(Choice::No, d("1")).unwrap();
        t.add(Choice::Veto, d("0.5")).unwrap();
        assert_eq!(t.yes_count, d("3.5"));
        assert_eq!(t.total_counts().unwrap(), d("5"));
    }

    #[test]
    fn test_rejects_bad_weight_and_choice() {
        let mut t = Tally::new();
        assert!(t.add(Choice::Yes, Decimal::ZERO).is_err());
        assert!(t.add(Choice::Yes, d("-1")).is_err());
        assert!(t.add(Choice::Unspecified, d("1")).is_err());
        assert_eq!(t, Tally::default());
    }

    #[test]
    fn test_sub_underflow() {
        let mut t = Tally::new();
        t.add(Choice::Abstain, d("1")).unwrap();
        assert!(t.sub(Choice::Abstain, d("2")).is_err());
        t.sub(Choice::Abstain, d("1")).unwrap();
        assert_eq!(t.abstain_count, Decimal::ZERO);
    }

    #[test]
    fn test_add_never_drops_weight() {
        let mut t = Tally::new();
        t.add(Choice::Yes, d("10000")).unwrap();
        let err = t.add(Choice::Yes, d("0.0000000000000000000000001")).unwrap_err();
        assert_eq!(err.code(), "INVALID_DECIMAL");
        assert_eq!(t.yes_count, d("10000"));
    }
}
