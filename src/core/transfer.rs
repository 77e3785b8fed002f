use crate::core::participant::ParticipantId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A recommended payment: `from` pays `to` the given `amount`.
///
/// `from` is always a debtor and `to` a creditor; the amount is positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Decimal,
}

impl Transfer {
    pub fn new(from: ParticipantId, to: ParticipantId, amount: Decimal) -> Self {
        Self { from, to, amount }
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}: {:.2}", self.from, self.to, self.amount.round_dp(2))
    }
}
