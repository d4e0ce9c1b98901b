use thiserror::Error;

/// Errors returned by sieve construction, queries and the handle registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The table covering `bound` could not be backed by memory.
    #[error("cannot allocate a sieve table covering [0, {bound}]")]
    Allocation { bound: u64 },

    /// The requested limit is above the engine's configured maximum.
    #[error("requested sieve limit {limit} exceeds the configured maximum {max}")]
    LimitExceeded { limit: u64, max: u64 },

    /// A query was made beyond the realized coverage of a table.
    #[error("{n} is beyond the sieve upper bound {bound}")]
    OutOfRange { n: u128, bound: u64 },

    /// The handle was destroyed already or was issued by another engine.
    #[error("invalid handle (slot {index}, generation {generation})")]
    InvalidHandle { index: usize, generation: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
