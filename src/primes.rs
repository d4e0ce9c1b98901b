//! Incremental prime generator backed by a regrowing [Sieve]

use crate::sieve::Sieve;
use crate::traits::{GrowthConfig, PrimeTable};
use log::{debug, warn};
use std::iter::FusedIterator;

/// Lifecycle of a [Primes] generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// no table built yet
    Fresh,
    /// a table is realized and the cursor is advancing
    Active,
    /// growth failed or hit the ceiling; only the sentinel is produced from now on
    Terminated,
}

/// Produces the primes in increasing order without a pre-known upper bound.
///
/// When the current table is exhausted a larger one is sieved from scratch and
/// replaces it, the cursor is preserved across the swap. Growth stops at
/// [GrowthConfig::max_bound] or on allocation failure, after which the
/// generator is terminated and returns the sentinel `0` (or `None` as an iterator).
#[derive(Debug)]
pub struct Primes {
    table: Option<Sieve>,
    last: Option<u64>, // last emitted prime, None before 2
    config: GrowthConfig,
    terminated: bool,
}

impl Default for Primes {
    fn default() -> Self {
        Self::new()
    }
}

impl Primes {
    #[inline]
    pub fn new() -> Self {
        Self::with_config(GrowthConfig::default())
    }

    pub fn with_config(config: GrowthConfig) -> Self {
        Primes { table: None, last: None, config, terminated: false }
    }

    pub fn state(&self) -> State {
        match (&self.table, self.terminated) {
            (_, true) => State::Terminated,
            (None, false) => State::Fresh,
            (Some(_), false) => State::Active,
        }
    }

    /// The last prime returned, None if nothing has been emitted yet
    #[inline]
    pub fn last_emitted(&self) -> Option<u64> {
        self.last
    }

    /// Coverage of the table currently owned, 0 if there is none
    pub fn upper_bound(&self) -> u64 {
        self.table.as_ref().map_or(0, |t| t.upper_bound())
    }

    #[inline]
    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    /// Get the next prime in the series, `0` once the generator is terminated
    #[inline]
    pub fn next_prime(&mut self) -> u64 {
        self.next().unwrap_or(0)
    }

    /// Replace the table with a larger one, return false if that is not possible
    fn grow(&mut self) -> bool {
        let bound = match &self.table {
            None => Some(self.config.first_bound()),
            Some(t) => self.config.next_bound(t.upper_bound()),
        };
        let bound = match bound {
            Some(b) => b,
            None => {
                warn!("prime generator reached its ceiling {}", self.config.max_bound);
                return false;
            }
        };

        // release the old table before building its replacement
        self.table = None;
        match Sieve::new(bound) {
            Ok(t) => {
                debug!("prime generator grew its table to [0, {}]", t.upper_bound());
                self.table = Some(t);
                true
            }
            Err(e) => {
                warn!("prime generator cannot grow: {}", e);
                false
            }
        }
    }
}

impl Iterator for Primes {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.terminated {
            return None;
        }

        let start = self.last.map_or(0, |p| p.saturating_add(1));
        loop {
            let max = self.config.max_bound;
            let found = self.table.as_ref().and_then(|t| t.primes_from(start).next());
            if let Some(p) = found.filter(|&p| p <= max) {
                self.last = Some(p);
                return Some(p);
            }
            if !self.grow() {
                self.terminated = true;
                self.table = None;
                return None;
            }
        }
    }
}

impl FusedIterator for Primes {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FIRST20: [u64; 20] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71];

    #[test]
    fn first_primes_test() {
        let mut p = Primes::new();
        assert_eq!(p.state(), State::Fresh);
        assert_eq!(p.last_emitted(), None);
        assert_eq!(p.upper_bound(), 0);

        let first: Vec<_> = (0..20).map(|_| p.next_prime()).collect();
        assert_eq!(first, FIRST20);
        assert_eq!(p.state(), State::Active);
        assert_eq!(p.last_emitted(), Some(71));
        assert_eq!(p.upper_bound(), 1025);

        assert_eq!(Primes::default().take(20).collect::<Vec<_>>(), FIRST20);
    }

    #[test]
    fn growth_test() {
        let reference: Vec<_> = Sieve::new(200_000).unwrap().primes().collect();
        let mut p = Primes::with_config(GrowthConfig::small());
        let mut bounds = vec![];
        for &expected in reference.iter() {
            assert_eq!(p.next_prime(), expected);
            if bounds.last() != Some(&p.upper_bound()) {
                bounds.push(p.upper_bound());
            }
        }
        assert_eq!(&bounds[..4], [17, 35, 71, 143]);
        assert!(bounds.windows(2).all(|w| w[0] < w[1]));

        // exhausting the table exactly still resumes in the next one
        let mut p = Primes::with_config(GrowthConfig { initial_bound: 13, ..GrowthConfig::small() });
        let first: Vec<_> = p.by_ref().take(7).collect();
        assert_eq!(first, FIRST20[..7]);
        assert_eq!(p.upper_bound(), 27);
    }

    #[test]
    fn ceiling_test() {
        let mut p = Primes::with_config(GrowthConfig { max_bound: 100, ..GrowthConfig::small() });
        let all: Vec<_> = p.by_ref().collect();
        assert_eq!(all.len(), 25);
        assert_eq!(all.last(), Some(&97));
        assert_eq!(p.state(), State::Terminated);
        assert_eq!(p.upper_bound(), 0);

        // terminated is absorbing
        assert_eq!(p.next_prime(), 0);
        assert_eq!(p.next_prime(), 0);
        assert_eq!(p.next(), None);
        assert_eq!(p.last_emitted(), Some(97));
    }

    #[test]
    fn allocation_failure_test() {
        let config = GrowthConfig { initial_bound: u64::MAX, max_bound: u64::MAX, ..GrowthConfig::default() };
        let mut p = Primes::with_config(config);
        assert_eq!(p.next_prime(), 0);
        assert_eq!(p.state(), State::Terminated);
        assert_eq!(p.last_emitted(), None);

        // a ceiling below 2 never yields anything
        let mut p = Primes::with_config(GrowthConfig::with_max_bound(1));
        assert_eq!(p.next(), None);
        assert_eq!(p.state(), State::Terminated);
    }

    proptest! {
        #[test]
        fn strictly_increasing_without_gaps(k in 1usize..400, initial in 0u64..64) {
            let config = GrowthConfig { initial_bound: initial, ..GrowthConfig::small() };
            let generated: Vec<_> = Primes::with_config(config).take(k).collect();
            let reference: Vec<_> = Sieve::new(3000).unwrap().primes().take(k).collect();
            prop_assert_eq!(generated, reference);
        }
    }
}
