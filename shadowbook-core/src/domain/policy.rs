//! Amount acceptance policy

use num_bigint::BigInt;
use num_traits::Signed;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Which amounts the service layer accepts before tracking an operation.
///
/// The tracker itself accepts every integer. `RejectNegative` is an opt-in
/// guard applied before anything is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountPolicy {
    #[default]
    Permissive,
    RejectNegative,
}

impl AmountPolicy {
    pub fn from_flag(reject_negative: bool) -> Self {
        if reject_negative {
            AmountPolicy::RejectNegative
        } else {
            AmountPolicy::Permissive
        }
    }

    /// Check an amount against the policy
    pub fn check(&self, amount: &BigInt) -> Result<()> {
        match self {
            AmountPolicy::Permissive => Ok(()),
            AmountPolicy::RejectNegative if amount.is_negative() => Err(Error::validation(
                format!("negative amount {} rejected", amount),
            )),
            AmountPolicy::RejectNegative => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissive_accepts_everything() {
        assert!(AmountPolicy::Permissive.check(&BigInt::from(-5)).is_ok());
        assert!(AmountPolicy::Permissive.check(&BigInt::from(0)).is_ok());
    }

    #[test]
    fn test_reject_negative() {
        let policy = AmountPolicy::from_flag(true);
        assert!(policy.check(&BigInt::from(0)).is_ok());
        assert!(policy.check(&BigInt::from(12)).is_ok());
        let err = policy.check(&BigInt::from(-1)).unwrap_err();
        assert!(err.to_string().contains("negative amount -1"));
    }
}
