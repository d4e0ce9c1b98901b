//! Bit-sieve primality tables with O(1) range queries, and an incremental
//! prime generator that regrows its sieve on demand.
//!
//! The [Engine] context exposes both behind generation-checked handles; with
//! the `ffi` feature the same operations are exported as C symbols from [ffi].

mod engine;
mod error;
mod primes;
mod sieve;
mod traits;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use engine::{Engine, PrimesHandle, PrimesScope, SieveHandle, SieveScope};
pub use error::{Error, Result};
pub use primes::{Primes, State};
pub use sieve::{Sieve, SievePrimes};
pub use traits::{EngineConfig, GrowthConfig, PrimeTable, PrimeTableExt};
