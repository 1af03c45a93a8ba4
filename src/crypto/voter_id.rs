//! Random voter identifiers

use crate::types::VoterId;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smallest identifier handed out
pub const VOTER_ID_MIN: u16 = 1000;

/// Largest identifier handed out
pub const VOTER_ID_MAX: u16 = 9999;

/// Draws 4-digit identifiers uniformly from [`VOTER_ID_MIN`, `VOTER_ID_MAX`]
pub struct VoterIdGenerator {
    rng: StdRng,
}

impl VoterIdGenerator {
    /// Create a generator seeded from the OS
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a reproducible generator
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw a single candidate identifier
    pub fn draw(&mut self) -> VoterId {
        self.rng.gen_range(VOTER_ID_MIN..=VOTER_ID_MAX).to_string()
    }

    /// Draw until `is_taken` reports a free identifier.
    ///
    /// Fails with [`Error::IdExhausted`] after `max_attempts` collisions.
    pub fn generate<F>(&mut self, max_attempts: u32, mut is_taken: F) -> Result<VoterId>
    where
        F: FnMut(&str) -> Result<bool>,
    {
        for attempt in 1..=max_attempts {
            let candidate = self.draw();
            if !is_taken(&candidate)? {
                return Ok(candidate);
            }
            tracing::debug!(attempt, "voter id collision, redrawing");
        }

        Err(Error::IdExhausted {
            attempts: max_attempts,
        })
    }
}

impl Default for VoterIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_draw_range() {
        let mut generator = VoterIdGenerator::with_seed(7);

        for _ in 0..1000 {
            let id = generator.draw();
            assert_eq!(id.len(), 4);
            let value: u16 = id.parse().unwrap();
            assert!((VOTER_ID_MIN..=VOTER_ID_MAX).contains(&value));
        }
    }

    #[test]
    fn test_generate_skips_taken_ids() {
        let mut taken = HashSet::new();
        let mut generator = VoterIdGenerator::with_seed(42);

        for _ in 0..500 {
            let id = generator
                .generate(1000, |candidate| Ok(taken.contains(candidate)))
                .unwrap();
            assert!(taken.insert(id));
        }
    }

    #[test]
    fn test_generate_is_bounded() {
        let mut generator = VoterIdGenerator::with_seed(1);
        let mut calls = 0;

        let result = generator.generate(5, |_| {
            calls += 1;
            Ok(true)
        });

        assert!(matches!(result, Err(Error::IdExhausted { attempts: 5 })));
        assert_eq!(calls, 5);
    }

    #[test]
    fn test_generate_propagates_lookup_errors() {
        let mut generator = VoterIdGenerator::with_seed(1);
        let result = generator.generate(5, |_| Err(Error::storage("lookup failed")));
        assert!(matches!(result, Err(Error::Storage { .. })));
    }
}
