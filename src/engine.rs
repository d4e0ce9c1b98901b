//! Explicit engine context owning sieves and generators behind integer handles
//!
//! Every live [Sieve] and [Primes] created through an [Engine] sits in a slot of
//! a registry, and callers only hold a `(slot, generation)` pair. Releasing a
//! handle bumps the slot's generation, so a stale, double-released or foreign
//! handle is reported as [Error::InvalidHandle] instead of touching freed state.

use crate::error::{Error, Result};
use crate::primes::{Primes, State};
use crate::sieve::Sieve;
use crate::traits::{EngineConfig, PrimeTable};
use log::trace;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

static NEXT_ENGINE_ID: AtomicU32 = AtomicU32::new(0);

/// Opaque reference to a [Sieve] owned by an [Engine]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SieveHandle {
    engine: u32,
    index: usize,
    generation: u32,
}

/// Opaque reference to a [Primes] generator owned by an [Engine]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimesHandle {
    engine: u32,
    index: usize,
    generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena with generation counters, freed slots are recycled
struct Registry<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Registry { slots: Vec::new(), free: Vec::new() }
    }

    fn insert(&mut self, value: T) -> (usize, u32) {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.value = Some(value);
                (index, slot.generation)
            }
            None => {
                self.slots.push(Slot { generation: 0, value: Some(value) });
                (self.slots.len() - 1, 0)
            }
        }
    }

    fn get(&self, index: usize, generation: u32) -> Result<&T> {
        self.slots
            .get(index)
            .filter(|s| s.generation == generation)
            .and_then(|s| s.value.as_ref())
            .ok_or(Error::InvalidHandle { index, generation })
    }

    fn get_mut(&mut self, index: usize, generation: u32) -> Result<&mut T> {
        self.slots
            .get_mut(index)
            .filter(|s| s.generation == generation)
            .and_then(|s| s.value.as_mut())
            .ok_or(Error::InvalidHandle { index, generation })
    }

    fn remove(&mut self, index: usize, generation: u32) -> Result<T> {
        let slot = self
            .slots
            .get_mut(index)
            .filter(|s| s.generation == generation && s.value.is_some())
            .ok_or(Error::InvalidHandle { index, generation })?;
        slot.generation = slot.generation.wrapping_add(1);
        let value = slot.value.take().ok_or(Error::InvalidHandle { index, generation })?;
        self.free.push(index);
        Ok(value)
    }

    fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

/// Context through which sieves and generators are created, queried and released.
///
/// Nothing is process-global: each engine owns its objects, its reuse cache and
/// its configuration, and dropping it releases whatever is still live.
pub struct Engine {
    id: u32,
    config: EngineConfig,
    sieves: Registry<Arc<Sieve>>,
    primes: Registry<Primes>,
    cache: Option<LruCache<u64, Weak<Sieve>>>, // keyed by realized bound, never keeps a table alive
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine {
            id: NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed),
            config,
            sieves: Registry::new(),
            primes: Registry::new(),
            cache: NonZeroUsize::new(config.cache_capacity).map(LruCache::new),
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of live sieve handles
    pub fn sieve_count(&self) -> usize {
        self.sieves.len()
    }

    /// Number of live generator handles
    pub fn primes_count(&self) -> usize {
        self.primes.len()
    }

    fn check_engine(&self, engine: u32, index: usize, generation: u32) -> Result<()> {
        if engine == self.id {
            Ok(())
        } else {
            Err(Error::InvalidHandle { index, generation })
        }
    }

    /// Find a live table for `limit` whose bound is not wastefully large
    fn cached(&mut self, limit: u64) -> Option<Arc<Sieve>> {
        let ceiling = (limit | 1).saturating_mul(self.config.reuse_factor.max(1));
        let cache = self.cache.as_mut()?;

        // tables whose last handle was destroyed are gone
        let dead: Vec<u64> = cache
            .iter()
            .filter(|(_, w)| w.strong_count() == 0)
            .map(|(&b, _)| b)
            .collect();
        for bound in dead {
            cache.pop(&bound);
        }

        let bound = cache
            .iter()
            .map(|(&b, _)| b)
            .filter(|&b| b >= limit && b <= ceiling)
            .min()?;
        cache.get(&bound).and_then(Weak::upgrade)
    }

    /// Create a sieve covering at least `[0, limit]`
    pub fn sieve_new(&mut self, limit: u64) -> Result<SieveHandle> {
        if let Some(max) = self.config.max_sieve_limit {
            if limit > max {
                return Err(Error::LimitExceeded { limit, max });
            }
        }

        let sieve = match self.cached(limit) {
            Some(s) => {
                trace!("reusing cached sieve [0, {}] for limit {}", s.upper_bound(), limit);
                s
            }
            None => {
                let s = Arc::new(Sieve::new(limit)?);
                if let Some(cache) = self.cache.as_mut() {
                    cache.put(s.upper_bound(), Arc::downgrade(&s));
                }
                s
            }
        };

        let (index, generation) = self.sieves.insert(sieve);
        trace!("issued sieve handle {}:{}", index, generation);
        Ok(SieveHandle { engine: self.id, index, generation })
    }

    /// Release a sieve, the handle is invalid afterwards
    pub fn sieve_destroy(&mut self, handle: SieveHandle) -> Result<()> {
        let SieveHandle { engine, index, generation } = handle;
        self.check_engine(engine, index, generation)?;
        self.sieves.remove(index, generation)?;
        trace!("released sieve handle {}:{}", index, generation);
        Ok(())
    }

    /// Shared access to the table, e.g. for concurrent readers on other threads
    pub fn sieve_table(&self, handle: SieveHandle) -> Result<Arc<Sieve>> {
        let SieveHandle { engine, index, generation } = handle;
        self.check_engine(engine, index, generation)?;
        self.sieves.get(index, generation).map(Arc::clone)
    }

    pub fn sieve_upper_bound(&self, handle: SieveHandle) -> Result<u64> {
        let SieveHandle { engine, index, generation } = handle;
        self.check_engine(engine, index, generation)?;
        Ok(self.sieves.get(index, generation)?.upper_bound())
    }

    pub fn sieve_is_prime(&self, handle: SieveHandle, n: u64) -> Result<bool> {
        let SieveHandle { engine, index, generation } = handle;
        self.check_engine(engine, index, generation)?;
        self.sieves.get(index, generation)?.is_prime(n)
    }

    /// Create a generator positioned before the first prime
    pub fn primes_new(&mut self) -> PrimesHandle {
        let (index, generation) = self.primes.insert(Primes::with_config(self.config.growth));
        trace!("issued generator handle {}:{}", index, generation);
        PrimesHandle { engine: self.id, index, generation }
    }

    /// Release a generator and its table, the handle is invalid afterwards
    pub fn primes_destroy(&mut self, handle: PrimesHandle) -> Result<()> {
        let PrimesHandle { engine, index, generation } = handle;
        self.check_engine(engine, index, generation)?;
        self.primes.remove(index, generation)?;
        trace!("released generator handle {}:{}", index, generation);
        Ok(())
    }

    /// Advance the generator, `Ok(0)` signals that it is terminated
    pub fn primes_next(&mut self, handle: PrimesHandle) -> Result<u64> {
        let PrimesHandle { engine, index, generation } = handle;
        self.check_engine(engine, index, generation)?;
        Ok(self.primes.get_mut(index, generation)?.next_prime())
    }

    pub fn primes_state(&self, handle: PrimesHandle) -> Result<State> {
        let PrimesHandle { engine, index, generation } = handle;
        self.check_engine(engine, index, generation)?;
        Ok(self.primes.get(index, generation)?.state())
    }

    /// Create a sieve that is released when the returned guard goes out of scope
    pub fn scope_sieve(&mut self, limit: u64) -> Result<SieveScope<'_>> {
        let handle = self.sieve_new(limit)?;
        let table = self.sieve_table(handle)?;
        Ok(SieveScope { engine: self, handle, table })
    }

    /// Create a generator that is released when the returned guard goes out of scope
    pub fn scope_primes(&mut self) -> PrimesScope<'_> {
        let handle = self.primes_new();
        PrimesScope { engine: self, handle, done: false }
    }
}

/// Scoped sieve handle, see [Engine::scope_sieve]
pub struct SieveScope<'e> {
    engine: &'e mut Engine,
    handle: SieveHandle,
    table: Arc<Sieve>,
}

impl<'e> SieveScope<'e> {
    #[inline]
    pub fn handle(&self) -> SieveHandle {
        self.handle
    }

    #[inline]
    pub fn upper_bound(&self) -> u64 {
        self.table.upper_bound()
    }

    #[inline]
    pub fn is_prime(&self, n: u64) -> Result<bool> {
        self.table.is_prime(n)
    }

    #[inline]
    pub fn table(&self) -> &Sieve {
        &self.table
    }
}

impl<'e> Drop for SieveScope<'e> {
    fn drop(&mut self) {
        // the guard borrows the engine exclusively, so the handle is still live
        let _ = self.engine.sieve_destroy(self.handle);
    }
}

/// Scoped generator handle, see [Engine::scope_primes].
///
/// Iterating pulls one prime per `primes_next` call and stops at the sentinel.
pub struct PrimesScope<'e> {
    engine: &'e mut Engine,
    handle: PrimesHandle,
    done: bool,
}

impl<'e> PrimesScope<'e> {
    #[inline]
    pub fn handle(&self) -> PrimesHandle {
        self.handle
    }

    pub fn state(&self) -> State {
        self.engine.primes_state(self.handle).unwrap_or(State::Terminated)
    }
}

impl<'e> Iterator for PrimesScope<'e> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.done {
            return None;
        }
        match self.engine.primes_next(self.handle) {
            Ok(p) if p != 0 => Some(p),
            _ => {
                self.done = true;
                None
            }
        }
    }
}

impl<'e> Drop for PrimesScope<'e> {
    fn drop(&mut self) {
        let _ = self.engine.primes_destroy(self.handle);
    }
}
