//! Election session: registration, vote casting, feedback and results
//!
//! One [`VotingSession`] owns every piece of mutable state (the store, the
//! running tally and the id generator). It enforces:
//!
//! 1. Registrants below the minimum age are turned away before an id is drawn
//! 2. Voter ids are unique among registered voters
//! 3. A vote is only accepted from a registered voter
//! 4. At most one vote per voter id
//! 5. The tally always sums to the number of stored votes

use crate::config::ElectionConfig;
use crate::crypto::VoterIdGenerator;
use crate::storage::VotingStore;
use crate::tally::{ElectionResult, Tally};
use crate::types::{Ballot, Feedback, Registration, VoteRecord, Voter, VoterId};
use crate::{Error, Result, storage_error};

pub struct VotingSession {
    ballot: Ballot,
    min_age: u32,
    max_id_attempts: u32,
    tally: Tally,
    store: Box<dyn VotingStore>,
    ids: VoterIdGenerator,
}

impl VotingSession {
    /// Start a session over `store`, picking up any votes it already holds
    pub fn open(config: &ElectionConfig, store: Box<dyn VotingStore>) -> Result<Self> {
        config.validate()?;

        let ballot = Ballot::from_config(config);
        let tally = Tally::with_counts(&ballot, &store.tally_counts()?)?;

        let stored_votes = store.votes()?.len() as u64;
        if tally.total() != stored_votes {
            tracing::error!(
                counted = tally.total(),
                stored = stored_votes,
                "tally does not match stored votes"
            );
            return Err(storage_error!(
                "tally counts {} votes but {} are stored",
                tally.total(),
                stored_votes
            ));
        }

        tracing::debug!(
            backend = store.backend(),
            options = ballot.option_count(),
            "session opened"
        );

        Ok(Self {
            ballot,
            min_age: config.min_age,
            max_id_attempts: config.max_id_attempts,
            tally,
            store,
            ids: VoterIdGenerator::new(),
        })
    }

    /// Replace the id generator, mostly to make ids reproducible in tests
    pub fn with_id_generator(mut self, ids: VoterIdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn ballot(&self) -> &Ballot {
        &self.ballot
    }

    pub fn store(&self) -> &dyn VotingStore {
        self.store.as_ref()
    }

    /// Register a voter and return their new id.
    ///
    /// Nothing is stored and no id is drawn when the registrant is too young.
    pub fn register(&mut self, registration: Registration) -> Result<VoterId> {
        if registration.age < self.min_age {
            tracing::warn!(
                age = registration.age,
                minimum = self.min_age,
                "registration rejected"
            );
            return Err(Error::Ineligible {
                age: registration.age,
                minimum: self.min_age,
            });
        }

        let store = &self.store;
        let voter_id = self.ids.generate(self.max_id_attempts, |candidate| {
            Ok(store.find_voter_by_id(candidate)?.is_some())
        })?;

        let voter = registration.into_voter(voter_id.clone());
        self.store.insert_voter(&voter)?;

        tracing::info!(voter_id = %voter_id, "voter registered");
        Ok(voter_id)
    }

    /// Look up a registered voter
    pub fn voter(&self, voter_id: &str) -> Result<Voter> {
        self.store
            .find_voter_by_id(voter_id)?
            .ok_or_else(|| Error::UnknownVoterId {
                voter_id: voter_id.to_string(),
            })
    }

    /// Check that `voter_id` is registered and has not voted yet.
    ///
    /// Run before presenting the ballot so a returning voter is turned away
    /// without choosing.
    pub fn ensure_can_vote(&self, voter_id: &str) -> Result<Voter> {
        let voter = self.voter(voter_id)?;

        if self.store.find_vote_by_voter_id(voter_id)?.is_some() {
            tracing::warn!(voter_id = %voter_id, "duplicate vote attempt");
            return Err(Error::DuplicateVote {
                voter_id: voter_id.to_string(),
            });
        }

        Ok(voter)
    }

    /// Cast `voter_id`'s vote for ballot option `choice` (1-based).
    ///
    /// The digest is computed with the time of this call. On any error the
    /// store and the tally are left as they were.
    pub fn cast_vote(&mut self, voter_id: &str, choice: usize) -> Result<VoteRecord> {
        self.ensure_can_vote(voter_id)?;
        let candidate = self.ballot.select(choice)?.to_string();

        let record = VoteRecord::seal(voter_id, &candidate);
        self.store.insert_vote(&record, &candidate)?;
        self.tally.record(&candidate)?;

        tracing::info!(
            voter_id = %voter_id,
            digest = &record.digest[..8],
            "vote cast"
        );
        Ok(record)
    }

    pub fn leave_feedback(&mut self, text: impl Into<String>) -> Result<()> {
        let feedback = Feedback { text: text.into() };
        self.store.insert_feedback(&feedback)?;
        tracing::debug!(len = feedback.text.len(), "feedback stored");
        Ok(())
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn results(&self) -> ElectionResult {
        let results = self.tally.results();
        if tracing::enabled!(tracing::Level::INFO) {
            match self.tally.to_json() {
                Ok(counts) => tracing::info!(%counts, %results, "results declared"),
                Err(err) => tracing::warn!(error = %err, "could not encode tally"),
            }
        }
        results
    }

    /// Registered voters ordered by voter id
    pub fn registered_voters(&self) -> Result<Vec<Voter>> {
        let mut voters = self.store.voters()?;
        voters.sort_by(|a, b| a.voter_id.cmp(&b.voter_id));
        Ok(voters)
    }

    /// Votes in the order they were cast
    pub fn votes(&self) -> Result<Vec<VoteRecord>> {
        self.store.votes()
    }

    /// Feedback in the order it was left
    pub fn feedbacks(&self) -> Result<Vec<Feedback>> {
        self.store.feedbacks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::VoteHasher;
    use crate::storage::MemoryStore;

    fn session() -> VotingSession {
        VotingSession::open(&ElectionConfig::default(), Box::new(MemoryStore::new()))
            .unwrap()
            .with_id_generator(VoterIdGenerator::with_seed(99))
    }

    fn adult(name: &str) -> Registration {
        Registration {
            name: name.to_string(),
            age: 30,
            city: "Springfield".to_string(),
            state: "IL".to_string(),
        }
    }

    #[test]
    fn test_underage_registration_is_rejected() {
        let mut session = session();
        let result = session.register(Registration {
            age: 17,
            ..adult("Kid")
        });

        assert!(matches!(
            result,
            Err(Error::Ineligible {
                age: 17,
                minimum: 18
            })
        ));
        assert!(session.registered_voters().unwrap().is_empty());
    }

    #[test]
    fn test_age_boundary() {
        let mut session = session();
        let voter_id = session
            .register(Registration {
                age: 18,
                ..adult("Just Eighteen")
            })
            .unwrap();

        assert_eq!(session.voter(&voter_id).unwrap().age, 18);
    }

    #[test]
    fn test_cast_vote_records_digest_and_tally() {
        let mut session = session();
        let voter_id = session.register(adult("Alice")).unwrap();

        let record = session.cast_vote(&voter_id, 2).unwrap();

        assert_eq!(record.voter_id, voter_id);
        assert_eq!(
            record.digest,
            VoteHasher::digest(&voter_id, "Candidate B", &record.timestamp)
        );
        assert_eq!(session.tally().count("Candidate B"), Some(1));
        assert_eq!(session.votes().unwrap(), vec![record]);
    }

    #[test]
    fn test_duplicate_vote_leaves_tally_unchanged() {
        let mut session = session();
        let voter_id = session.register(adult("Bob")).unwrap();
        session.cast_vote(&voter_id, 1).unwrap();

        let before = session.tally().clone();
        let second = session.cast_vote(&voter_id, 3);

        assert!(matches!(second, Err(Error::DuplicateVote { .. })));
        assert!(matches!(
            session.ensure_can_vote(&voter_id),
            Err(Error::DuplicateVote { .. })
        ));
        assert_eq!(session.tally(), &before);
        assert_eq!(session.votes().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_voter_cannot_vote() {
        let mut session = session();
        let result = session.cast_vote("0000", 1);

        assert!(matches!(result, Err(Error::UnknownVoterId { .. })));
        assert_eq!(session.tally().total(), 0);
    }

    #[test]
    fn test_invalid_choice_does_not_consume_vote() {
        let mut session = session();
        let voter_id = session.register(adult("Carol")).unwrap();

        assert!(matches!(
            session.cast_vote(&voter_id, 0),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            session.cast_vote(&voter_id, 5),
            Err(Error::InvalidInput { .. })
        ));

        // Still allowed to vote properly afterwards
        session.cast_vote(&voter_id, 4).unwrap();
        assert_eq!(session.tally().count("Not Anyone"), Some(1));
    }

    #[test]
    fn test_registered_voters_sorted_by_id() {
        let mut session = session();
        for name in ["Dan", "Eve", "Fay", "Gus"] {
            session.register(adult(name)).unwrap();
        }

        let ids: Vec<_> = session
            .registered_voters()
            .unwrap()
            .into_iter()
            .map(|v| v.voter_id)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_feedback_is_appended() {
        let mut session = session();
        session.leave_feedback("Queue was short").unwrap();
        session.leave_feedback("").unwrap();

        let texts: Vec<_> = session
            .feedbacks()
            .unwrap()
            .into_iter()
            .map(|f| f.text)
            .collect();
        assert_eq!(texts, vec!["Queue was short", ""]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ElectionConfig {
            candidates: vec![],
            ..ElectionConfig::default()
        };
        assert!(VotingSession::open(&config, Box::new(MemoryStore::new())).is_err());
    }
}
