//! Hashing and identifier generation for the voting system

pub mod voter_id;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

pub use voter_id::{VOTER_ID_MAX, VOTER_ID_MIN, VoterIdGenerator};

/// Length of a hex-encoded vote digest
pub const DIGEST_HEX_LEN: usize = 64;

/// One-way commitment over a cast vote
pub struct VoteHasher;

impl VoteHasher {
    /// SHA-256 of `voter_id || candidate || timestamp`, hex encoded.
    ///
    /// The timestamp goes in as RFC 3339 text with microsecond precision.
    pub fn digest(voter_id: &str, candidate: &str, timestamp: &DateTime<Utc>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(voter_id.as_bytes());
        hasher.update(candidate.as_bytes());
        hasher.update(crate::types::format_timestamp(timestamp).as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Whether `value` has the shape of a digest
    pub fn is_well_formed(value: &str) -> bool {
        value.len() == DIGEST_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
    }
}
