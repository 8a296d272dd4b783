//! Environment abstraction for deterministic testing.
//!
//! Decouples the codec from system resources (wall clock, randomness). Tests
//! substitute a controllable clock to exercise validity windows at exact
//! boundaries; production uses [`SystemEnv`].

use std::time::{SystemTime, UNIX_EPOCH};

use cookieseal_crypto::{CryptoError, fill_random};

/// Clock and randomness consumed by a codec.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production and
///   never repeats output
/// - `random_bytes()` reports failure instead of returning weak bytes
pub trait Environment: Send + Sync {
    /// Current wall-clock time in whole seconds since the Unix epoch.
    fn unix_time(&self) -> i64;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Errors
    ///
    /// - `Entropy`: If the entropy source failed. The current operation must
    ///   be aborted.
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), CryptoError>;
}

/// Production environment using the system clock and the OS CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::disallowed_methods)]
    fn unix_time(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
            // Clock set before 1970
            Err(e) => i64::try_from(e.duration().as_secs()).map_or(i64::MIN, |secs| -secs),
        }
    }

    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), CryptoError> {
        fill_random(buffer)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    };

    use super::*;

    /// Environment with a manually driven clock. Clones share the clock.
    #[derive(Debug, Clone)]
    pub(crate) struct ManualEnv {
        now: Arc<AtomicI64>,
    }

    impl ManualEnv {
        pub(crate) fn at(now: i64) -> Self {
            Self { now: Arc::new(AtomicI64::new(now)) }
        }

        pub(crate) fn set(&self, now: i64) {
            self.now.store(now, Ordering::SeqCst);
        }
    }

    impl Environment for ManualEnv {
        fn unix_time(&self) -> i64 {
            self.now.load(Ordering::SeqCst)
        }

        fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), CryptoError> {
            fill_random(buffer)
        }
    }

    /// Environment whose entropy source is broken.
    #[derive(Debug, Clone, Copy)]
    pub(crate) struct NoEntropyEnv;

    impl Environment for NoEntropyEnv {
        fn unix_time(&self) -> i64 {
            1_700_000_000
        }

        fn random_bytes(&self, _buffer: &mut [u8]) -> Result<(), CryptoError> {
            Err(CryptoError::Entropy { reason: "entropy source unavailable".to_string() })
        }
    }
}
