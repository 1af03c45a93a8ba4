//! SQLite storage backend
//!
//! Schema:
//!
//! - `voters(id, name, age, city, state, voter_id UNIQUE)`
//! - `votes(id, voter_id UNIQUE, vote_digest, timestamp_text)`
//! - `feedbacks(id, text)`
//! - `tallies(candidate PRIMARY KEY, votes)`

use super::{EntityKind, Listing, VotingStore};
use crate::types::{Feedback, VoteRecord, Voter};
use crate::{Result, storage_error};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS voters (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT    NOT NULL,
    age      INTEGER NOT NULL,
    city     TEXT    NOT NULL,
    state    TEXT    NOT NULL,
    voter_id TEXT    NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS votes (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    voter_id       TEXT NOT NULL UNIQUE,
    vote_digest    TEXT NOT NULL,
    timestamp_text TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS feedbacks (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS tallies (
    candidate TEXT PRIMARY KEY,
    votes     INTEGER NOT NULL DEFAULT 0
);
";

/// Persists the session in a local SQLite database
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Private database that disappears with the connection
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn voter_from_row(row: &Row<'_>) -> rusqlite::Result<Voter> {
        Ok(Voter {
            name: row.get(0)?,
            age: row.get(1)?,
            city: row.get(2)?,
            state: row.get(3)?,
            voter_id: row.get(4)?,
        })
    }

    fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<VoteRecord> {
        let timestamp_text: String = row.get(2)?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
            .with_timezone(&Utc);

        Ok(VoteRecord {
            voter_id: row.get(0)?,
            digest: row.get(1)?,
            timestamp,
        })
    }
}

impl VotingStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn insert_voter(&mut self, voter: &Voter) -> Result<()> {
        self.conn.execute(
            "INSERT INTO voters (name, age, city, state, voter_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![voter.name, voter.age, voter.city, voter.state, voter.voter_id],
        )?;
        Ok(())
    }

    fn find_voter_by_id(&self, voter_id: &str) -> Result<Option<Voter>> {
        let voter = self
            .conn
            .query_row(
                "SELECT name, age, city, state, voter_id FROM voters WHERE voter_id = ?1",
                params![voter_id],
                Self::voter_from_row,
            )
            .optional()?;
        Ok(voter)
    }

    fn insert_vote(&mut self, vote: &VoteRecord, candidate: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO votes (voter_id, vote_digest, timestamp_text) VALUES (?1, ?2, ?3)",
            params![vote.voter_id, vote.digest, vote.timestamp_text()],
        )?;
        tx.execute(
            "INSERT INTO tallies (candidate, votes) VALUES (?1, 1)
             ON CONFLICT(candidate) DO UPDATE SET votes = votes + 1",
            params![candidate],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn find_vote_by_voter_id(&self, voter_id: &str) -> Result<Option<VoteRecord>> {
        let vote = self
            .conn
            .query_row(
                "SELECT voter_id, vote_digest, timestamp_text FROM votes WHERE voter_id = ?1",
                params![voter_id],
                Self::vote_from_row,
            )
            .optional()?;
        Ok(vote)
    }

    fn insert_feedback(&mut self, feedback: &Feedback) -> Result<()> {
        self.conn
            .execute("INSERT INTO feedbacks (text) VALUES (?1)", params![feedback.text])?;
        Ok(())
    }

    fn list_all(&self, kind: EntityKind) -> Result<Listing> {
        let listing = match kind {
            EntityKind::Voters => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT name, age, city, state, voter_id FROM voters ORDER BY id")?;
                let voters = stmt
                    .query_map([], Self::voter_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Listing::Voters(voters)
            }
            EntityKind::Votes => {
                let mut stmt = self.conn.prepare(
                    "SELECT voter_id, vote_digest, timestamp_text FROM votes ORDER BY id",
                )?;
                let votes = stmt
                    .query_map([], Self::vote_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Listing::Votes(votes)
            }
            EntityKind::Feedbacks => {
                let mut stmt = self.conn.prepare("SELECT text FROM feedbacks ORDER BY id")?;
                let feedbacks = stmt
                    .query_map([], |row| Ok(Feedback { text: row.get(0)? }))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Listing::Feedbacks(feedbacks)
            }
        };
        Ok(listing)
    }

    fn tally_counts(&self) -> Result<HashMap<String, u64>> {
        let mut stmt = self.conn.prepare("SELECT candidate, votes FROM tallies")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut counts = HashMap::with_capacity(rows.len());
        for (candidate, votes) in rows {
            let votes = u64::try_from(votes)
                .map_err(|_| storage_error!("negative tally for {}: {}", candidate, votes))?;
            counts.insert(candidate, votes);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn voter(id: &str) -> Voter {
        Voter {
            name: "Linus".to_string(),
            age: 28,
            city: "Helsinki".to_string(),
            state: "Uusimaa".to_string(),
            voter_id: id.to_string(),
        }
    }

    #[test]
    fn test_voter_roundtrip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_voter(&voter("5555")).unwrap();
        store.insert_voter(&voter("1234")).unwrap();

        assert_eq!(store.find_voter_by_id("5555").unwrap(), Some(voter("5555")));
        assert_eq!(store.find_voter_by_id("0000").unwrap(), None);

        let ids: Vec<_> = store
            .voters()
            .unwrap()
            .into_iter()
            .map(|v| v.voter_id)
            .collect();
        assert_eq!(ids, vec!["5555", "1234"]);
    }

    #[test]
    fn test_voter_id_is_unique() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_voter(&voter("5555")).unwrap();

        let dup = store.insert_voter(&voter("5555"));
        assert!(matches!(dup, Err(Error::Database(_))));
    }

    #[test]
    fn test_vote_and_tally_are_written_together() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let vote = VoteRecord::seal("5555", "Candidate B");
        store.insert_vote(&vote, "Candidate B").unwrap();

        assert_eq!(store.find_vote_by_voter_id("5555").unwrap(), Some(vote.clone()));
        assert_eq!(store.tally_counts().unwrap().get("Candidate B"), Some(&1));

        // Second vote for the same voter rolls back, tally included
        assert!(store.insert_vote(&vote, "Candidate B").is_err());
        assert_eq!(store.tally_counts().unwrap().get("Candidate B"), Some(&1));
        assert_eq!(store.votes().unwrap().len(), 1);
    }

    #[test]
    fn test_feedbacks_listed_in_order() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for text in ["great", "slow queue"] {
            store
                .insert_feedback(&Feedback {
                    text: text.to_string(),
                })
                .unwrap();
        }

        match store.list_all(EntityKind::Feedbacks).unwrap() {
            Listing::Feedbacks(feedbacks) => {
                assert_eq!(feedbacks[0].text, "great");
                assert_eq!(feedbacks[1].text, "slow queue");
            }
            other => panic!("unexpected listing {other:?}"),
        }
    }

    #[test]
    fn test_bad_timestamp_surfaces_as_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO votes (voter_id, vote_digest, timestamp_text) VALUES ('1', 'x', 'yesterday')",
                [],
            )
            .unwrap();

        assert!(store.find_vote_by_voter_id("1").is_err());
    }
}
