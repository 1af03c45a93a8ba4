//! Vote counting and result declaration

use crate::types::Ballot;
use crate::{Result, input_error, storage_error};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Votes received by one ballot option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub candidate: String,
    pub votes: u64,
}

impl fmt::Display for TallyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} votes", self.candidate, self.votes)
    }
}

/// Running vote count for every ballot option, in ballot order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    entries: Vec<TallyEntry>,
}

impl Tally {
    /// Zero count for every option on the ballot
    pub fn new(ballot: &Ballot) -> Self {
        Self {
            entries: ballot
                .labels()
                .map(|label| TallyEntry {
                    candidate: label.to_string(),
                    votes: 0,
                })
                .collect(),
        }
    }

    /// Start from previously stored counts.
    ///
    /// Fails when votes were counted for an option that is no longer on the
    /// ballot. Zero counts for retired options are skipped.
    pub fn with_counts(ballot: &Ballot, counts: &HashMap<String, u64>) -> Result<Self> {
        let mut orphaned: Vec<&str> = counts
            .iter()
            .filter(|(name, votes)| **votes > 0 && !ballot.contains(name))
            .map(|(name, _)| name.as_str())
            .collect();
        if !orphaned.is_empty() {
            orphaned.sort_unstable();
            tracing::error!(?orphaned, "stored votes for options not on the ballot");
            return Err(storage_error!(
                "stored votes for options not on the ballot: {}",
                orphaned.join(", ")
            ));
        }

        let mut tally = Self::new(ballot);
        for entry in &mut tally.entries {
            entry.votes = counts.get(&entry.candidate).copied().unwrap_or(0);
        }
        Ok(tally)
    }

    /// Count one vote for `candidate`
    pub fn record(&mut self, candidate: &str) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.candidate == candidate)
            .ok_or_else(|| input_error!("'{}' is not on the ballot", candidate))?;
        entry.votes += 1;
        Ok(())
    }

    pub fn count(&self, candidate: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.candidate == candidate)
            .map(|e| e.votes)
    }

    /// Total votes counted, abstentions included
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.votes).sum()
    }

    pub fn entries(&self) -> &[TallyEntry] {
        &self.entries
    }

    /// Counts as a JSON array, for structured logs
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Option(s) holding the highest count.
    ///
    /// With no votes at all every option is tied at zero.
    pub fn results(&self) -> ElectionResult {
        let max = self.entries.iter().map(|e| e.votes).max().unwrap_or(0);
        let mut leaders: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.votes == max)
            .map(|e| e.candidate.clone())
            .collect();

        if leaders.len() == 1 {
            ElectionResult::Winner {
                candidate: leaders.remove(0),
                votes: max,
            }
        } else {
            ElectionResult::Tie {
                candidates: leaders,
                votes: max,
            }
        }
    }
}

/// Outcome of [`Tally::results`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectionResult {
    Winner { candidate: String, votes: u64 },
    Tie { candidates: Vec<String>, votes: u64 },
}

impl fmt::Display for ElectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winner { candidate, votes } => {
                write!(f, "Winner: {candidate} with {votes} votes")
            }
            Self::Tie { candidates, votes } => write!(
                f,
                "Tie between: {} with {votes} votes each",
                candidates.join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn ballot() -> Ballot {
        Ballot::new(vec!["A".into(), "B".into(), "C".into()], "abstain")
    }

    fn tally_of(counts: &[(&str, u64)]) -> Tally {
        let counts = counts
            .iter()
            .map(|(name, votes)| (name.to_string(), *votes))
            .collect();
        Tally::with_counts(&ballot(), &counts).unwrap()
    }

    #[test]
    fn test_tie_between_leaders() {
        let tally = tally_of(&[("A", 3), ("B", 3), ("C", 1), ("abstain", 0)]);

        assert_eq!(
            tally.results(),
            ElectionResult::Tie {
                candidates: vec!["A".into(), "B".into()],
                votes: 3
            }
        );
        assert_eq!(
            tally.results().to_string(),
            "Tie between: A, B with 3 votes each"
        );
    }

    #[test]
    fn test_sole_winner() {
        let tally = tally_of(&[("A", 5)]);

        assert_eq!(
            tally.results(),
            ElectionResult::Winner {
                candidate: "A".into(),
                votes: 5
            }
        );
        assert_eq!(tally.results().to_string(), "Winner: A with 5 votes");
    }

    #[test]
    fn test_no_votes_ties_everyone() {
        let tally = Tally::new(&ballot());

        match tally.results() {
            ElectionResult::Tie { candidates, votes } => {
                assert_eq!(candidates, vec!["A", "B", "C", "abstain"]);
                assert_eq!(votes, 0);
            }
            other => panic!("expected a tie, got {other:?}"),
        }
    }

    #[test]
    fn test_abstention_can_win() {
        let tally = tally_of(&[("A", 1), ("abstain", 2)]);
        assert_eq!(
            tally.results(),
            ElectionResult::Winner {
                candidate: "abstain".into(),
                votes: 2
            }
        );
    }

    #[test]
    fn test_record_and_total() {
        let mut tally = Tally::new(&ballot());
        tally.record("A").unwrap();
        tally.record("A").unwrap();
        tally.record("abstain").unwrap();

        assert_eq!(tally.count("A"), Some(2));
        assert_eq!(tally.count("B"), Some(0));
        assert_eq!(tally.count("abstain"), Some(1));
        assert_eq!(tally.total(), 3);

        assert!(matches!(tally.record("Z"), Err(Error::InvalidInput { .. })));
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_retired_option_without_votes_is_skipped() {
        let tally = tally_of(&[("A", 2), ("Retired", 0)]);
        assert_eq!(tally.total(), 2);
        assert_eq!(tally.count("Retired"), None);
    }

    #[test]
    fn test_votes_for_retired_option_are_rejected() {
        let counts = HashMap::from([("A".to_string(), 2), ("Retired".to_string(), 9)]);
        let result = Tally::with_counts(&ballot(), &counts);

        match result {
            Err(Error::Storage { message }) => assert!(message.contains("Retired")),
            other => panic!("expected a storage error, got {other:?}"),
        }
    }

    #[test]
    fn test_json_snapshot() {
        let tally = tally_of(&[("A", 1), ("abstain", 2)]);
        assert_eq!(
            tally.to_json().unwrap(),
            r#"[{"candidate":"A","votes":1},{"candidate":"B","votes":0},{"candidate":"C","votes":0},{"candidate":"abstain","votes":2}]"#
        );
    }

    #[test]
    fn test_entry_display_order() {
        let tally = tally_of(&[("B", 4)]);
        let lines: Vec<String> = tally.entries().iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec!["A: 0 votes", "B: 4 votes", "C: 0 votes", "abstain: 0 votes"]
        );
    }
}
