//! Storage abstraction for voters, votes and feedback
//!
//! The session only talks to [`VotingStore`], so the in-memory and SQLite
//! backends are interchangeable. The backend is picked once, when the store
//! is opened.

pub mod memory;
pub mod sqlite;

use crate::config::{StorageBackend, StorageConfig};
use crate::types::{Feedback, VoteRecord, Voter};
use crate::{Result, storage_error};
use std::collections::HashMap;
use std::fmt;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Kinds of stored entity that can be listed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Voters,
    Votes,
    Feedbacks,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Voters => "voters",
            Self::Votes => "votes",
            Self::Feedbacks => "feedbacks",
        };
        f.write_str(name)
    }
}

/// Everything stored for one [`EntityKind`], in insertion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Voters(Vec<Voter>),
    Votes(Vec<VoteRecord>),
    Feedbacks(Vec<Feedback>),
}

impl Listing {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Voters(_) => EntityKind::Voters,
            Self::Votes(_) => EntityKind::Votes,
            Self::Feedbacks(_) => EntityKind::Feedbacks,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Voters(v) => v.len(),
            Self::Votes(v) => v.len(),
            Self::Feedbacks(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Storage interface shared by all backends.
///
/// Backends reject a second voter with the same id and a second vote for the
/// same voter; the session checks both before writing, so hitting either
/// rejection means the store and the session disagree.
pub trait VotingStore {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    fn insert_voter(&mut self, voter: &Voter) -> Result<()>;

    fn find_voter_by_id(&self, voter_id: &str) -> Result<Option<Voter>>;

    /// Record a vote and count it for `candidate` in one step.
    ///
    /// The candidate is only used for the counter; it is not stored with the
    /// vote record.
    fn insert_vote(&mut self, vote: &VoteRecord, candidate: &str) -> Result<()>;

    fn find_vote_by_voter_id(&self, voter_id: &str) -> Result<Option<VoteRecord>>;

    fn insert_feedback(&mut self, feedback: &Feedback) -> Result<()>;

    fn list_all(&self, kind: EntityKind) -> Result<Listing>;

    /// Votes counted per candidate name
    fn tally_counts(&self) -> Result<HashMap<String, u64>>;

    fn voters(&self) -> Result<Vec<Voter>> {
        match self.list_all(EntityKind::Voters)? {
            Listing::Voters(voters) => Ok(voters),
            other => Err(storage_error!("asked for voters, got {}", other.kind())),
        }
    }

    fn votes(&self) -> Result<Vec<VoteRecord>> {
        match self.list_all(EntityKind::Votes)? {
            Listing::Votes(votes) => Ok(votes),
            other => Err(storage_error!("asked for votes, got {}", other.kind())),
        }
    }

    fn feedbacks(&self) -> Result<Vec<Feedback>> {
        match self.list_all(EntityKind::Feedbacks)? {
            Listing::Feedbacks(feedbacks) => Ok(feedbacks),
            other => Err(storage_error!("asked for feedbacks, got {}", other.kind())),
        }
    }
}

/// Open the configured backend
pub fn open_store(config: &StorageConfig) -> Result<Box<dyn VotingStore>> {
    let store: Box<dyn VotingStore> = match config.backend {
        StorageBackend::Memory => Box::new(MemoryStore::new()),
        StorageBackend::Sqlite => Box::new(SqliteStore::open(&config.path)?),
    };

    tracing::info!(
        backend = store.backend(),
        path = %config.path.display(),
        "store opened"
    );
    Ok(store)
}
