//! C boundary over opaque pointers.
//!
//! Each `*_new` function hands out an owning pointer that must be returned
//! exactly once to the matching `*_destroy` function. Null is accepted
//! everywhere and never dereferenced, but use after destroy, double destroy
//! and concurrent `primes_next` calls on one generator are the caller's
//! responsibility. The safe handle API with detection of those mistakes is
//! [Engine](crate::Engine).

use crate::primes::Primes;
use crate::sieve::Sieve;
use crate::traits::PrimeTable;
use libc::{c_int, c_uint};
use log::warn;
use std::ptr;

/// Create a sieve covering at least `[0, limit]`, null if it cannot be allocated
#[no_mangle]
pub extern "C" fn sieve_new(limit: c_uint) -> *mut Sieve {
    match Sieve::new(limit as u64) {
        Ok(s) => Box::into_raw(Box::new(s)),
        Err(e) => {
            warn!("sieve_new({}) failed: {}", limit, e);
            ptr::null_mut()
        }
    }
}

/// # Safety
///
/// `sieve` must be null or a pointer returned by [sieve_new] that was not destroyed yet.
#[no_mangle]
pub unsafe extern "C" fn sieve_destroy(sieve: *mut Sieve) {
    if !sieve.is_null() {
        drop(Box::from_raw(sieve));
    }
}

/// The realized coverage of the sieve, saturated to `c_uint`. Returns 0 for null.
///
/// # Safety
///
/// `sieve` must be null or a live pointer returned by [sieve_new].
#[no_mangle]
pub unsafe extern "C" fn sieve_upper_bound(sieve: *const Sieve) -> c_uint {
    match sieve.as_ref() {
        Some(s) => c_uint::try_from(s.upper_bound()).unwrap_or(c_uint::MAX),
        None => 0,
    }
}

/// Returns 1 if `n` is a prime, 0 if not, and -1 if `n` is beyond the upper
/// bound or `sieve` is null.
///
/// The result is signed: test for `== 1`. A caller that declares the return as
/// `unsigned int` and tests `!= 0` reads the -1 error as "prime".
///
/// # Safety
///
/// `sieve` must be null or a live pointer returned by [sieve_new].
#[no_mangle]
pub unsafe extern "C" fn sieve_is_prime(sieve: *const Sieve, n: c_uint) -> c_int {
    match sieve.as_ref().map(|s| s.is_prime(n as u64)) {
        Some(Ok(true)) => 1,
        Some(Ok(false)) => 0,
        _ => -1,
    }
}

/// Create a generator positioned before the first prime
#[no_mangle]
pub extern "C" fn primes_new() -> *mut Primes {
    Box::into_raw(Box::new(Primes::new()))
}

/// # Safety
///
/// `primes` must be null or a pointer returned by [primes_new] that was not destroyed yet.
#[no_mangle]
pub unsafe extern "C" fn primes_destroy(primes: *mut Primes) {
    if !primes.is_null() {
        drop(Box::from_raw(primes));
    }
}

/// Get the next prime in the series.
///
/// If zero is returned then the generator is finished (or `primes` is null).
///
/// # Safety
///
/// `primes` must be null or a live pointer returned by [primes_new], and no
/// other thread may call this function on the same pointer at the same time.
#[no_mangle]
pub unsafe extern "C" fn primes_next(primes: *mut Primes) -> c_uint {
    match primes.as_mut() {
        Some(p) => c_uint::try_from(p.next_prime()).unwrap_or(0),
        None => 0,
    }
}
