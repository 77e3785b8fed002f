//! Random expense logs for benchmarks and property testing.
//!
//! Amounts are drawn in whole cents so every generated log is exactly
//! representable.

use crate::core::expense::{ExpenseLog, ExpenseRecord};
use crate::core::participant::ParticipantId;
use rand::Rng;
use rust_decimal::Decimal;

/// Configuration for generating a random expense log.
#[derive(Debug, Clone)]
pub struct RandomLogConfig {
    /// Number of distinct participants that may appear.
    pub participant_count: usize,
    /// Number of expenses to record.
    pub expense_count: usize,
    /// Smallest amount, in cents.
    pub min_cents: i64,
    /// Largest amount, in cents (inclusive).
    pub max_cents: i64,
}

impl Default for RandomLogConfig {
    fn default() -> Self {
        Self {
            participant_count: 3,
            expense_count: 30,
            min_cents: 1,
            max_cents: 50_000,
        }
    }
}

/// Participant names used by the generator: `P-000`, `P-001`, ...
pub fn participant_names(count: usize) -> Vec<ParticipantId> {
    (0..count)
        .map(|i| ParticipantId::new(format!("P-{:03}", i)))
        .collect()
}

/// Generate a random expense log.
pub fn generate_random_log(config: &RandomLogConfig) -> ExpenseLog {
    let mut rng = rand::thread_rng();
    let participants = participant_names(config.participant_count);
    let mut log = ExpenseLog::new();

    if participants.is_empty() || config.min_cents > config.max_cents {
        return log;
    }
    let min_cents = config.min_cents.max(0);

    for _ in 0..config.expense_count {
        let who = &participants[rng.gen_range(0..participants.len())];
        let cents = rng.gen_range(min_cents..=config.max_cents.max(min_cents));
        if let Ok(record) = ExpenseRecord::new(who.clone(), Decimal::new(cents, 2)) {
            log.add(record);
        }
    }

    log
}
