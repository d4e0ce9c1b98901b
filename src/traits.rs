use crate::error::{Error, Result};
use num_traits::{PrimInt, Unsigned};

/// A precomputed primality table covering `[0, upper_bound()]`
pub trait PrimeTable<'a> {
    type PrimeIter: Iterator<Item = u64>;

    /// The largest integer the table has an answer for
    fn upper_bound(&self) -> u64;

    /// Look up the primality of `n`. Querying past the upper bound is an error
    /// rather than a silent `false`.
    fn is_prime(&self, n: u64) -> Result<bool>;

    /// Iterate the primes in `[start, upper_bound()]` in increasing order
    fn primes_from(&'a self, start: u64) -> Self::PrimeIter;

    /// Count the primes not greater than `n`
    fn prime_pi(&self, n: u64) -> Result<u64>;
}

pub trait PrimeTableExt: for<'a> PrimeTable<'a> {
    /// Same as [PrimeTable::is_prime] but accepts any unsigned primitive
    fn check<T: PrimInt + Unsigned>(&self, n: T) -> Result<bool> {
        match n.to_u64() {
            Some(v) => self.is_prime(v),
            None => Err(Error::OutOfRange {
                n: n.to_u128().unwrap_or(u128::MAX),
                bound: self.upper_bound(),
            }),
        }
    }

    /// Return the k-th prime (1-based, so `nth_prime(1) == Some(2)`),
    /// or None if it lies beyond the table
    fn nth_prime(&self, k: usize) -> Option<u64> {
        if k == 0 {
            return None;
        }
        self.primes_from(0).nth(k - 1)
    }
}

impl<T> PrimeTableExt for T where for<'a> T: PrimeTable<'a> {}

/// Growth policy of the incremental prime generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthConfig {
    /// bound of the first table built
    pub initial_bound: u64,

    /// the bound is multiplied by this on every growth
    pub factor: u64,

    /// minimum increase of the bound on every growth
    pub min_step: u64,

    /// the generator terminates once a table of this bound is exhausted
    pub max_bound: u64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        // primes past u32::MAX would be truncated by the C boundary
        Self { initial_bound: 1 << 10, factor: 2, min_step: 1 << 10, max_bound: u32::MAX as u64 }
    }
}

impl GrowthConfig {
    /// A tiny starting table, useful to exercise growth on short sequences
    pub fn small() -> Self {
        Self { initial_bound: 16, factor: 2, min_step: 8, ..Self::default() }
    }

    /// Default growth, capped at `max_bound`
    pub fn with_max_bound(max_bound: u64) -> Self {
        Self { max_bound, ..Self::default() }
    }

    /// The bound of the first table
    pub fn first_bound(&self) -> u64 {
        self.initial_bound.min(self.max_bound)
    }

    /// The bound to grow to from `current`, None if the ceiling has been reached
    pub fn next_bound(&self, current: u64) -> Option<u64> {
        if current >= self.max_bound {
            return None;
        }
        let grown = current
            .checked_mul(self.factor)
            .unwrap_or(u64::MAX)
            .max(current.saturating_add(self.min_step))
            .min(self.max_bound);
        if grown > current {
            Some(grown)
        } else {
            None
        }
    }
}

/// Configuration of an [Engine](crate::Engine) context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// growth policy for every generator created by the engine
    pub growth: GrowthConfig,

    /// refuse sieve requests above this limit, None means no limit aside from memory
    pub max_sieve_limit: Option<u64>,

    /// number of built sieves kept for reuse, 0 disables the cache
    pub cache_capacity: usize,

    /// a cached sieve is reused for `limit` if its bound is at most `limit * reuse_factor`
    pub reuse_factor: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { growth: GrowthConfig::default(), max_sieve_limit: None, cache_capacity: 8, reuse_factor: 2 }
    }
}

impl EngineConfig {
    /// Every `sieve_new` builds a fresh table
    pub fn uncached() -> Self {
        Self { cache_capacity: 0, ..Self::default() }
    }
}
