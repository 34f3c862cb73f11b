//! Deterministic random number generation for shuffles and seat rotation.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical shuffles, so a game can be
//!   replayed from its seed plus the sequence of agent decisions.
//! - **Forkable**: A tournament derives one independent, reproducible seed per
//!   game by forking its master RNG.
//!
//! ```
//! use uno_arena::core::GameRng;
//!
//! let mut master = GameRng::new(42);
//! let game0 = master.fork();
//! let game1 = master.fork();
//! assert_ne!(game0.seed(), game1.seed());
//!
//! let mut again = GameRng::new(42);
//! assert_eq!(again.fork().seed(), game0.seed());
//! ```

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Deterministic RNG backed by ChaCha8.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Create an RNG from a fresh random seed.
    ///
    /// The seed is still recorded, so an unseeded game can be reproduced later.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random::<u64>())
    }

    /// The seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork this RNG to create an independent branch.
    ///
    /// Each fork produces a different but deterministic sequence.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self
            .seed
            .wrapping_add(self.fork_counter.wrapping_mul(0x9E3779B97F4A7C15));
        Self::new(fork_seed)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    /// Choose a random element from a slice.
    #[must_use]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        slice.choose(&mut self.inner)
    }
}
