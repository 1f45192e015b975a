//! Vote choices and vote records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::address::Address;
use crate::error::{GovError, GovResult};

/// Vote choice, one byte on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Choice {
    /// Abstention from the aggregate vector; never a real vote
    Unspecified = 0,
    Yes = 1,
    No = 2,
    Abstain = 3,
    Veto = 4,
}

impl Choice {
    /// Choices that may be cast, in wire order
    pub const VOTING: [Choice; 4] = [Choice::Yes, Choice::No, Choice::Abstain, Choice::Veto];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> GovResult<Self> {
        match value {
            0 => Ok(Self::Unspecified),
            1 => Ok(Self::Yes),
            2 => Ok(Self::No),
            3 => Ok(Self::Abstain),
            4 => Ok(Self::Veto),
            other => Err(GovError::InvalidArgument(format!("unknown choice {}", other))),
        }
    }

    pub fn is_specified(self) -> bool {
        self != Self::Unspecified
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Yes => "YES",
            Self::No => "NO",
            Self::Abstain => "ABSTAIN",
            Self::Veto => "VETO",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload each member signs for an aggregate vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteBasic {
    pub proposal_id: u64,
    pub choice: Choice,
    pub deadline: DateTime<Utc>,
}

/// A recorded vote, at most one per (proposal, voter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: u64,
    pub voter: Address,
    pub choice: Choice,
    #[serde(with = "super::bytes")]
    pub metadata: Vec<u8>,
    pub submit_time: DateTime<Utc>,
}
