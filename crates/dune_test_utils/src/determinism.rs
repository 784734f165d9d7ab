//! Determinism testing utilities.
//!
//! Bots and the simulation must produce identical results from identical
//! inputs. Sources of divergence this harness is meant to catch:
//!
//! - **Floating-point math**: distances and percentages use
//!   [`dune_core::math::Fixed`] or integer arithmetic.
//! - **Iteration order**: the object arena is a `BTreeMap`, never a
//!   randomized hash map.
//! - **Randomness**: every random draw goes through a seeded
//!   [`dune_core::rng::SeededRng`] whose state is saved with the game.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use dune_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// `setup` builds the initial state, `step` advances it one cycle and
/// `hash` fingerprints the final state. Works for a bare [`Simulation`] as
/// well as a simulation driven by bots.
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a bare simulation twice and compare final hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Compare two runs cycle by cycle and report the first cycle at which
/// they differ.
pub fn find_first_divergence<S, Setup, Step, HashFn>(
    setup: Setup,
    step: Step,
    hash: HashFn,
    num_ticks: u64,
) -> Option<u64>
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut a = setup();
    let mut b = setup();
    if hash(&a) != hash(&b) {
        return Some(0);
    }
    for tick in 1..=num_ticks {
        step(&mut a);
        step(&mut b);
        if hash(&a) != hash(&b) {
            tracing::warn!(tick, "runs diverged");
            return Some(tick);
        }
    }
    None
}

/// Verify that a save/restore cycle preserves the simulation exactly.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    for _ in 0..num_ticks {
        sim.tick();
    }
    let hash_before = sim.state_hash();

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(restored) = Simulation::deserialize(&bytes) else {
        return false;
    };
    hash_before == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::skirmish_world;

    #[test]
    fn test_verify_determinism_detects_divergence() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            3,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |s| *s,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 3);
    }

    #[test]
    fn test_skirmish_simulation_is_deterministic() {
        assert!(verify_simulation_determinism(
            || Simulation::new(skirmish_world()),
            300
        ));
    }

    #[test]
    fn test_skirmish_survives_save_and_restore() {
        assert!(verify_serialization_determinism(
            || Simulation::new(skirmish_world()),
            50
        ));
    }

    #[test]
    fn test_no_divergence_in_skirmish() {
        let first = find_first_divergence(
            || Simulation::new(skirmish_world()),
            |sim| {
                sim.tick();
            },
            Simulation::state_hash,
            100,
        );
        assert_eq!(first, None);
    }
}
