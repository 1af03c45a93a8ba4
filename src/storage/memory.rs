//! Volatile storage backend

use super::{EntityKind, Listing, VotingStore};
use crate::types::{Feedback, VoteRecord, Voter};
use crate::{Result, storage_error};
use std::collections::HashMap;

/// Keeps everything in insertion-ordered vectors for the life of the process
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    voters: Vec<Voter>,
    votes: Vec<VoteRecord>,
    feedbacks: Vec<Feedback>,
    tallies: HashMap<String, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VotingStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn insert_voter(&mut self, voter: &Voter) -> Result<()> {
        if self.voters.iter().any(|v| v.voter_id == voter.voter_id) {
            return Err(storage_error!("voter id {} already registered", voter.voter_id));
        }
        self.voters.push(voter.clone());
        Ok(())
    }

    fn find_voter_by_id(&self, voter_id: &str) -> Result<Option<Voter>> {
        Ok(self.voters.iter().find(|v| v.voter_id == voter_id).cloned())
    }

    fn insert_vote(&mut self, vote: &VoteRecord, candidate: &str) -> Result<()> {
        if self.votes.iter().any(|v| v.voter_id == vote.voter_id) {
            return Err(storage_error!("voter {} already has a vote", vote.voter_id));
        }
        self.votes.push(vote.clone());
        *self.tallies.entry(candidate.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn find_vote_by_voter_id(&self, voter_id: &str) -> Result<Option<VoteRecord>> {
        Ok(self.votes.iter().find(|v| v.voter_id == voter_id).cloned())
    }

    fn insert_feedback(&mut self, feedback: &Feedback) -> Result<()> {
        self.feedbacks.push(feedback.clone());
        Ok(())
    }

    fn list_all(&self, kind: EntityKind) -> Result<Listing> {
        Ok(match kind {
            EntityKind::Voters => Listing::Voters(self.voters.clone()),
            EntityKind::Votes => Listing::Votes(self.votes.clone()),
            EntityKind::Feedbacks => Listing::Feedbacks(self.feedbacks.clone()),
        })
    }

    fn tally_counts(&self) -> Result<HashMap<String, u64>> {
        Ok(self.tallies.clone())
    }
}
