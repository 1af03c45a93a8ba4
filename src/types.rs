//! # Core Types for the Voting System
//!
//! - [`Voter`]: a registered voter, immutable once created
//! - [`Registration`]: what a voter supplies before an id is assigned
//! - [`VoteRecord`]: the one vote a voter may cast, sealed with a digest
//! - [`Feedback`]: free-text comments
//! - [`Ballot`]: the options a voter chooses from, abstention included
//!
//! Vote records never carry the chosen candidate. The choice only survives in
//! the digest and in the per-candidate tally.

use crate::config::ElectionConfig;
use crate::crypto::VoteHasher;
use crate::{Result, input_error};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// 4-digit voter identifier, kept as text the way it is typed in
pub type VoterId = String;

/// Details collected at registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub age: u32,
    pub city: String,
    pub state: String,
}

impl Registration {
    /// Attach the assigned identifier
    pub fn into_voter(self, voter_id: VoterId) -> Voter {
        Voter {
            name: self.name,
            age: self.age,
            city: self.city,
            state: self.state,
            voter_id,
        }
    }
}

/// A registered voter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub name: String,
    pub age: u32,
    pub city: String,
    pub state: String,
    pub voter_id: VoterId,
}

/// A cast vote
///
/// The digest is SHA-256 over the voter id, the chosen option and the
/// timestamp. It is stored as an opaque commitment; nothing re-verifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub voter_id: VoterId,
    /// Hex-encoded, 64 characters
    pub digest: String,
    pub timestamp: DateTime<Utc>,
}

impl VoteRecord {
    /// Seal a vote for `candidate`, stamping it with the current time.
    pub fn seal(voter_id: &str, candidate: &str) -> Self {
        Self::seal_at(voter_id, candidate, Utc::now())
    }

    /// Seal a vote at a given instant.
    ///
    /// The timestamp is truncated to microseconds so the stored text form
    /// round-trips to exactly the instant that was hashed.
    pub fn seal_at(voter_id: &str, candidate: &str, at: DateTime<Utc>) -> Self {
        let timestamp = at.trunc_subsecs(6);
        let digest = VoteHasher::digest(voter_id, candidate, &timestamp);

        Self {
            voter_id: voter_id.to_string(),
            digest,
            timestamp,
        }
    }

    /// Timestamp in the text form used for hashing and storage
    pub fn timestamp_text(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// RFC 3339 with microsecond precision
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A piece of voter feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub text: String,
}

/// The options offered when casting a vote
///
/// Options are numbered from 1: candidates first, then abstention as the
/// last option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    candidates: Vec<String>,
    abstain_label: String,
}

impl Ballot {
    pub fn new(candidates: Vec<String>, abstain_label: impl Into<String>) -> Self {
        Self {
            candidates,
            abstain_label: abstain_label.into(),
        }
    }

    pub fn from_config(config: &ElectionConfig) -> Self {
        Self::new(config.candidates.clone(), config.abstain_label.clone())
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn abstain_label(&self) -> &str {
        &self.abstain_label
    }

    /// Number of selectable options, abstention included
    pub fn option_count(&self) -> usize {
        self.candidates.len() + 1
    }

    /// All option labels in ballot order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.candidates
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.abstain_label.as_str()))
    }

    /// `(number, label)` pairs as shown to the voter
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels().enumerate().map(|(i, label)| (i + 1, label))
    }

    /// Resolve a 1-based option number
    pub fn select(&self, choice: usize) -> Result<&str> {
        if choice == 0 || choice > self.option_count() {
            return Err(input_error!(
                "choice {} is out of range 1-{}",
                choice,
                self.option_count()
            ));
        }

        Ok(self
            .candidates
            .get(choice - 1)
            .map(String::as_str)
            .unwrap_or(self.abstain_label.as_str()))
    }

    /// Validate a typed option number, returning it for [`Ballot::select`]
    pub fn parse_choice(&self, input: &str) -> Result<usize> {
        let choice = input
            .trim()
            .parse::<usize>()
            .map_err(|_| input_error!("'{}' is not a valid number", input.trim()))?;
        self.select(choice)?;
        Ok(choice)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels().any(|l| l == label)
    }
}
