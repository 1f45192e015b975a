//! Canonical encoding of [`VoteBasic`]
//!
//! Layout:
//!
//! ```text
//! "gv:VoteBasic:v1\0" || proposal_id (u64 BE) || choice (u8) || len (u8) || deadline
//! ```
//!
//! `deadline` is RFC3339 UTC with exactly nine fractional digits and a `Z`
//! suffix, e.g. `2024-01-01T00:00:00.000000000Z`. Years outside `0000..=9999`
//! have no fixed-width RFC3339 form and are rejected.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use tracing::trace;

use crate::constants::{MAX_DEADLINE_YEAR, VOTE_BASIC_TAG};
use crate::error::{GovError, GovResult};
use crate::types::{Choice, VoteBasic};

/// Canonical RFC3339 form of a deadline
pub fn format_deadline(deadline: &DateTime<Utc>) -> GovResult<String> {
    let year = deadline.year();
    if !(0..=MAX_DEADLINE_YEAR).contains(&year) {
        return Err(GovError::InvalidArgument(format!(
            "deadline year {} outside 0000..=9999",
            year
        )));
    }
    Ok(deadline.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

/// Encode the bytes a voter signs
pub fn encode_vote_basic(vote: &VoteBasic) -> GovResult<Vec<u8>> {
    let deadline = format_deadline(&vote.deadline)?;
    let deadline_len = u8::try_from(deadline.len())
        .map_err(|_| GovError::InvalidArgument("deadline too long".to_string()))?;

    let mut out = Vec::with_capacity(VOTE_BASIC_TAG.len() + 8 + 1 + 1 + deadline.len());
    out.extend_from_slice(VOTE_BASIC_TAG);
    out.extend_from_slice(&vote.proposal_id.to_be_bytes());
    out.push(vote.choice.as_u8());
    out.push(deadline_len);
    out.extend_from_slice(deadline.as_bytes());
    trace!(
        proposal_id = vote.proposal_id,
        choice = %vote.choice,
        bytes = %hex::encode(&out),
        "Encoded vote bytes"
    );
    Ok(out)
}

/// Decode bytes produced by [`encode_vote_basic`], rejecting non-canonical input
pub fn decode_vote_basic(bytes: &[u8]) -> GovResult<VoteBasic> {
    let malformed = |what: &str| GovError::InvalidArgument(format!("malformed vote bytes: {}", what));

    let rest = bytes
        .strip_prefix(VOTE_BASIC_TAG)
        .ok_or_else(|| malformed("missing domain tag"))?;
    if rest.len() < 10 {
        return Err(malformed("truncated header"));
    }

    let mut id = [0u8; 8];
    id.copy_from_slice(&rest[..8]);
    let proposal_id = u64::from_be_bytes(id);
    let choice = Choice::from_u8(rest[8])?;
    let deadline_len = rest[9] as usize;
    let deadline_bytes = &rest[10..];
    if deadline_bytes.len() != deadline_len {
        return Err(malformed("deadline length"));
    }

    let text = std::str::from_utf8(deadline_bytes).map_err(|_| malformed("deadline utf-8"))?;
    let deadline = DateTime::parse_from_rfc3339(text)
        .map_err(|e| malformed(&format!("deadline: {}", e)))?
        .with_timezone(&Utc);
    if format_deadline(&deadline)? != text {
        return Err(malformed("non-canonical deadline"));
    }

    Ok(VoteBasic {
        proposal_id,
        choice,
        deadline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jan_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_known_vector() {
        let vote = VoteBasic {
            proposal_id: 1,
            choice: Choice::Yes,
            deadline: jan_first(),
        };
        let bytes = encode_vote_basic(&vote).unwrap();

        let mut expected = b"gv:VoteBasic:v1\0".to_vec();
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]);
        expected.push(1);
        expected.push(30);
        expected.extend_from_slice(b"2024-01-01T00:00:00.000000000Z");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let vote = VoteBasic {
            proposal_id: u64::MAX,
            choice: Choice::Veto,
            deadline: jan_first() + chrono::Duration::nanoseconds(123_456_789),
        };
        let bytes = encode_vote_basic(&vote).unwrap();
        assert_eq!(decode_vote_basic(&bytes).unwrap(), vote);
    }

    #[test]
    fn test_distinct_inputs_distinct_bytes() {
        let base = VoteBasic {
            proposal_id: 7,
            choice: Choice::Yes,
            deadline: jan_first(),
        };
        let variants = [
            VoteBasic { proposal_id: 8, ..base.clone() },
            VoteBasic { choice: Choice::No, ..base.clone() },
            VoteBasic {
                deadline: base.deadline + chrono::Duration::nanoseconds(1),
                ..base.clone()
            },
        ];
        let base_bytes = encode_vote_basic(&base).unwrap();
        for v in &variants {
            assert_ne!(encode_vote_basic(v).unwrap(), base_bytes);
        }
    }

    #[test]
    fn test_rejects_far_future_year() {
        let vote = VoteBasic {
            proposal_id: 1,
            choice: Choice::Yes,
            deadline: Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap(),
        };
        assert!(encode_vote_basic(&vote).is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_vote_basic(b"nope").is_err());

        let vote = VoteBasic {
            proposal_id: 1,
            choice: Choice::Yes,
            deadline: jan_first(),
        };
        let mut bytes = encode_vote_basic(&vote).unwrap();
        bytes.pop();
        assert!(decode_vote_basic(&bytes).is_err());

        let mut bytes = encode_vote_basic(&vote).unwrap();
        let choice_at = VOTE_BASIC_TAG.len() + 8;
        bytes[choice_at] = 9;
        assert!(decode_vote_basic(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_offset_deadline() {
        let text = b"2024-01-01T01:00:00.000000000+01:00";
        let mut bytes = VOTE_BASIC_TAG.to_vec();
        bytes.extend_from_slice(&1u64.to_be_bytes());
        bytes.push(1);
        bytes.push(text.len() as u8);
        bytes.extend_from_slice(text);
        assert!(decode_vote_basic(&bytes).is_err());
    }
}
