//! Short code generation.
//!
//! Codes are lowercase hex strings of a fixed length. Entropy comes from an
//! injected [`RandomSource`] so production uses the operating system CSPRNG
//! while tests can replay a seeded sequence.

use std::sync::{Arc, Mutex, PoisonError};

use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde_json::json;

use crate::error::AppError;

/// Code length used when none is configured: 3 random bytes, 16^6 codes.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Shortest accepted code length.
pub const MIN_CODE_LENGTH: usize = 4;

/// Longest accepted code length (bounded by the `short_code` column).
pub const MAX_CODE_LENGTH: usize = 32;

/// Source of random bytes for [`CodeGenerator`].
///
/// Implementations must be safe to call from many tasks at once.
pub trait RandomSource: Send + Sync {
    /// Fills `buf` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the entropy source is unavailable.
    fn fill(&self, buf: &mut [u8]) -> Result<(), AppError>;
}

/// Operating system CSPRNG via `getrandom`.
///
/// Every call reads fresh entropy; there is no shared state to lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), AppError> {
        getrandom::fill(buf).map_err(|e| {
            AppError::internal(
                "System random number generator failed",
                json!({ "reason": e.to_string() }),
            )
        })
    }
}

/// Deterministic source seeded with a `u64`.
///
/// Two instances built from the same seed yield the same byte stream. Meant
/// for tests and reproducible fixtures, never for serving traffic.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), AppError> {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(buf);
        Ok(())
    }
}

/// Produces candidate short codes of a fixed length over `[0-9a-f]`.
///
/// A generated code is only a candidate: uniqueness is established by the
/// store when the code is inserted.
#[derive(Clone)]
pub struct CodeGenerator {
    source: Arc<dyn RandomSource>,
    length: usize,
}

impl CodeGenerator {
    /// Creates a generator; `length` is clamped to
    /// [`MIN_CODE_LENGTH`]..=[`MAX_CODE_LENGTH`].
    pub fn new(source: Arc<dyn RandomSource>, length: usize) -> Self {
        Self {
            source,
            length: length.clamp(MIN_CODE_LENGTH, MAX_CODE_LENGTH),
        }
    }

    /// Generator backed by [`SystemRandom`].
    pub fn system(length: usize) -> Self {
        Self::new(Arc::new(SystemRandom), length)
    }

    /// Generator backed by [`SeededRandom`].
    pub fn seeded(seed: u64, length: usize) -> Self {
        Self::new(Arc::new(SeededRandom::new(seed)), length)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Draws `ceil(length / 2)` random bytes and hex-encodes them, keeping
    /// the first `length` characters.
    ///
    /// # Errors
    ///
    /// Propagates failures of the random source.
    pub fn generate(&self) -> Result<String, AppError> {
        let mut buffer = vec![0u8; self.length.div_ceil(2)];
        self.source.fill(&mut buffer)?;

        let mut code = hex::encode(buffer);
        code.truncate(self.length);
        Ok(code)
    }

    /// Returns true if `code` has this generator's length and alphabet.
    pub fn is_well_formed(&self, code: &str) -> bool {
        code.len() == self.length && code.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::system(DEFAULT_CODE_LENGTH)
    }
}
