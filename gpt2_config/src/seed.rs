//! Reproducible randomness: every random draw of a run comes from one generator
//! seeded from [`crate::Config::seed`].

use rand::SeedableRng;
use rand::rngs::StdRng;

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
