use crate::core::participant::ParticipantId;
use thiserror::Error;

/// Errors signalled by the settlement engine.
///
/// Both variants are caller contract violations. Empty input, a single
/// participant or all-zero amounts are valid and never produce an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// An expense amount is negative or not a finite number.
    #[error("invalid amount {amount} recorded for {participant}")]
    InvalidAmount {
        participant: ParticipantId,
        /// Rendered as text so non-finite floats can be reported as-is.
        amount: String,
    },
    /// The share policy or tolerance cannot produce meaningful balances.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SettlementError {
    pub(crate) fn invalid_amount(participant: &ParticipantId, amount: impl ToString) -> Self {
        Self::InvalidAmount {
            participant: participant.clone(),
            amount: amount.to_string(),
        }
    }
}
