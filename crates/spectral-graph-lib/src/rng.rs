//! Deterministic RNG handle threaded explicitly through constructors that
//! sample (the CKNS lattice builder, the E2LSH hyperplane generator).
//!
//! The source this crate is modeled on relies on a process-wide random
//! generator shared between sampling and the (out of scope) random-graph
//! generators. We thread an explicit handle instead, so a `CknsKde` built
//! twice from the same seed produces byte-identical lattices (spec section 8,
//! "median-of-estimates idempotence").

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// A cloneable, seedable RNG handle.
///
/// Substreams (one per lattice cell, one per LSH table) are derived by
/// seeding a fresh `Xoshiro256PlusPlus` from `(master_seed, substream_id)`
/// rather than sharing one mutable generator across threads, so lattice
/// construction can fan out across a thread pool without any RNG-side
/// synchronisation.
#[derive(Debug, Clone)]
pub struct RngHandle {
    seed: u64,
    rng: Xoshiro256PlusPlus,
}

impl RngHandle {
    /// Creates a new handle from a master seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// The master seed this handle (and all its substreams) were derived from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns a mutable reference to the underlying generator.
    pub fn inner_mut(&mut self) -> &mut Xoshiro256PlusPlus {
        &mut self.rng
    }

    /// Derives an independent, deterministic substream for `substream_id`.
    ///
    /// Two handles created from the same master seed yield bit-identical
    /// substreams for the same id, regardless of the order substreams are
    /// requested in or which thread requests them.
    pub fn substream(&self, substream_id: u64) -> Self {
        let derived_seed = splitmix_combine(self.seed, substream_id);
        Self {
            seed: derived_seed,
            rng: Xoshiro256PlusPlus::seed_from_u64(derived_seed),
        }
    }
}

impl RngCore for RngHandle {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Combines a master seed and a substream id into a new 64-bit seed using the
/// SplitMix64 finaliser (cheap, well-mixed, no external hashing dependency).
fn splitmix_combine(seed: u64, substream_id: u64) -> u64 {
    let mut z = seed
        .wrapping_add(substream_id.wrapping_mul(0x9E3779B97F4A7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
