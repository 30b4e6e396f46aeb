//! Random member selection.
//!
//! The randomness is injected so tests can script exact choices and
//! production can draw from OS entropy.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PickError;
use crate::types::Member;

/// Source of uniformly distributed indices.
pub trait RandomSource: Send {
    /// Return an index in `[0, upper)`. `upper` is always at least 1.
    fn next_index(&mut self, upper: usize) -> usize;
}

/// [`RandomSource`] backed by `StdRng`.
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Reproducible source for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Production source seeded from the OS.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        self.rng.random_range(0..upper)
    }
}

/// Pick one member uniformly at random.
///
/// Candidates are de-duplicated by handle (first occurrence wins), then the
/// first candidate equal to `omit` is removed.
pub fn pick(
    candidates: &[Member],
    omit: Option<&Member>,
    rng: &mut dyn RandomSource,
) -> Result<Member, PickError> {
    let mut seen = HashSet::new();
    let mut pool: Vec<&Member> = candidates
        .iter()
        .filter(|m| seen.insert(m.handle.as_str()))
        .collect();

    if let Some(omit) = omit {
        if let Some(idx) = pool.iter().position(|m| *m == omit) {
            pool.remove(idx);
        }
    }

    if pool.is_empty() {
        return Err(PickError::NoEligibleUsers);
    }

    let idx = rng.next_index(pool.len());
    Ok(pool[idx].clone())
}
