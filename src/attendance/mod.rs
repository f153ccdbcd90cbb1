//! Attendance token lifecycle and lateness aggregation.
//!
//! Tokens are issued per user, checked without side effects, and consumed exactly
//! once on submission. Reports are computed from used tokens; a token's
//! `created_at` is the check-in time.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, SubsecRound};

pub mod aggregation;
pub mod calendar;
pub mod clock;
pub mod mysql;
pub mod report;
pub mod store;
pub mod submission;
pub mod validation;

mod issuance;

#[cfg(test)]
pub mod memory;

pub use submission::SubmissionOutcome;
pub use validation::TokenStatus;

use clock::{Clock, EntropySource, OsEntropy, SystemClock};
use store::AttendanceStore;

pub struct AttendanceEngine {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
}

impl AttendanceEngine {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
    ) -> Self {
        Self {
            store,
            clock,
            entropy,
        }
    }

    pub fn with_system_sources(store: Arc<dyn AttendanceStore>) -> Self {
        Self::new(store, Arc::new(SystemClock), Arc::new(OsEntropy))
    }

    /// Current time at the precision the store keeps (whole seconds).
    fn now(&self) -> NaiveDateTime {
        self.clock.now().trunc_subsecs(0)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}
