use chrono::{Local, NaiveDateTime};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{AppError, AppResult};

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Cryptographically secure random bytes.
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> AppResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> AppResult<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| AppError::RandomSource(e.to_string()))
    }
}
