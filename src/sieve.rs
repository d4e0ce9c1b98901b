//! Bit-packed sieve of Eratosthenes answering point queries on a fixed range

use crate::error::{Error, Result};
use crate::traits::PrimeTable;
use bitvec::prelude::{BitSlice, BitVec, Lsb0};
use log::{debug, warn};
use num_integer::Integer;
use std::iter::FusedIterator;

type Table = BitVec<usize, Lsb0>;

/// Primality of every integer in `[0, upper_bound()]`, computed once at construction.
///
/// Only odd numbers are stored (bit `i` stands for `2i + 1`), so the realized
/// bound is the requested limit rounded up to an odd number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sieve {
    composite: Table, // composite[i] is set iff 2i + 1 is not a prime
    bound: u64,
}

/// Allocate a zeroed table with one bit per odd number up to `bound`, without aborting on OOM
fn alloc_table(bound: u64) -> Result<Table> {
    let nbits = usize::try_from(bound / 2 + 1)
        .ok()
        .filter(|&n| n <= BitSlice::<usize, Lsb0>::MAX_BITS)
        .ok_or(Error::Allocation { bound })?;
    let nwords = (nbits + usize::BITS as usize - 1) / usize::BITS as usize;

    let mut words: Vec<usize> = Vec::new();
    words
        .try_reserve_exact(nwords)
        .map_err(|_| Error::Allocation { bound })?;
    words.resize(nwords, 0);

    let mut table = Table::from_vec(words);
    table.truncate(nbits);
    Ok(table)
}

impl Sieve {
    /// Sieve every integer in `[0, limit]` (the realized bound may be `limit + 1`)
    pub fn new(limit: u64) -> Result<Self> {
        let bound = limit | 1; // make sure bound is odd
        let mut composite = alloc_table(bound).map_err(|e| {
            warn!("failed to allocate a sieve table for limit {}", limit);
            e
        })?;
        composite.set(0, true); // 1 is not a prime

        // the odd multiples of p starting from p*p sit at indices p*p/2 + k*p
        let len = composite.len();
        for p in (3..=num_integer::sqrt(bound)).step_by(2) {
            if composite[(p / 2) as usize] {
                continue;
            }
            for i in ((p * p / 2) as usize..len).step_by(p as usize) {
                composite.set(i, true);
            }
        }

        debug!("built sieve table covering [0, {}]", bound);
        Ok(Sieve { composite, bound })
    }

    /// Iterate all primes in the table
    #[inline]
    pub fn primes(&self) -> SievePrimes<'_> {
        self.primes_from(0)
    }
}

impl<'a> PrimeTable<'a> for Sieve {
    type PrimeIter = SievePrimes<'a>;

    #[inline]
    fn upper_bound(&self) -> u64 {
        self.bound
    }

    fn is_prime(&self, n: u64) -> Result<bool> {
        if n > self.bound {
            return Err(Error::OutOfRange { n: n as u128, bound: self.bound });
        }
        if n.is_even() {
            return Ok(n == 2);
        }
        Ok(!self.composite[(n / 2) as usize])
    }

    fn primes_from(&'a self, start: u64) -> SievePrimes<'a> {
        // 2 * (start / 2) + 1 is the first odd number not below start
        let next = usize::try_from(start / 2)
            .unwrap_or(usize::MAX)
            .min(self.composite.len());
        SievePrimes {
            composite: &self.composite,
            two: start <= 2 && self.bound >= 2,
            next,
        }
    }

    fn prime_pi(&self, n: u64) -> Result<u64> {
        if n > self.bound {
            return Err(Error::OutOfRange { n: n as u128, bound: self.bound });
        }
        let odds = ((n + 1) / 2) as usize;
        let odd_primes = self.composite[..odds].count_zeros() as u64;
        Ok(odd_primes + (n >= 2) as u64)
    }
}

/// Increasing iterator over the primes of a [Sieve]
#[derive(Debug, Clone)]
pub struct SievePrimes<'a> {
    composite: &'a BitSlice<usize, Lsb0>,
    two: bool,
    next: usize, // index of the next odd number to look at
}

impl<'a> Iterator for SievePrimes<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.two {
            self.two = false;
            return Some(2);
        }
        match self.composite[self.next..].first_zero() {
            Some(offset) => {
                let i = self.next + offset;
                self.next = i + 1;
                Some(i as u64 * 2 + 1)
            }
            None => {
                self.next = self.composite.len();
                None
            }
        }
    }
}

impl<'a> FusedIterator for SievePrimes<'a> {}
