//! Deterministic per-element RNG.
//!
//! Each element gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (element_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive element IDs uniformly across the seed space.
//! Route-following picks made by one vehicle never depend on how many other
//! vehicles exist or in which order they update.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand::seq::SliceRandom;

use crate::ElementId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-element deterministic RNG.
#[derive(Clone, Debug)]
pub struct AgentRng(SmallRng);

impl AgentRng {
    /// Seed deterministically from the run's global seed and an element ID.
    pub fn new(global_seed: u64, element: ElementId) -> Self {
        let seed = global_seed ^ (element.0 as u64).wrapping_mul(MIXING_CONSTANT);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// Choose a random element from a slice.  Returns `None` if it is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.0)
    }
}
