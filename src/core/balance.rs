use crate::core::participant::ParticipantId;
use crate::core::transfer::Transfer;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a participant stands once the tolerance is taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceStatus {
    /// Within tolerance of zero.
    Settled,
    /// Paid more than the share; others owe this participant.
    Owed,
    /// Paid less than the share.
    Owes,
}

/// A participant's net position against the equal share.
///
/// A positive `net_amount` means the participant over-paid and is owed
/// money. A negative one means the participant owes money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub participant: ParticipantId,
    /// Total the participant paid.
    pub spent: Decimal,
    /// `spent - share`.
    pub net_amount: Decimal,
}

impl Balance {
    pub fn new(participant: ParticipantId, spent: Decimal, share: Decimal) -> Self {
        Self {
            participant,
            spent,
            net_amount: spent - share,
        }
    }

    /// Agrees with [`Balance::status`]: exactly `epsilon` away counts as settled.
    pub fn is_settled(&self, epsilon: Decimal) -> bool {
        self.net_amount.abs() <= epsilon
    }

    pub fn status(&self, epsilon: Decimal) -> BalanceStatus {
        if self.net_amount > epsilon {
            BalanceStatus::Owed
        } else if self.net_amount < -epsilon {
            BalanceStatus::Owes
        } else {
            BalanceStatus::Settled
        }
    }
}

/// Balances of every participant, in order of first appearance.
///
/// Iteration order is stable: payers appear in the order their first
/// expense was recorded, followed by any roster members who paid nothing.
/// Lookups are linear; a sheet covers one small group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// Total spent by everyone.
    total: Decimal,
    /// Target contribution per participant.
    share: Decimal,
    balances: Vec<Balance>,
}

impl BalanceSheet {
    /// The "nothing to settle" sheet.
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(total: Decimal, share: Decimal, balances: Vec<Balance>) -> Self {
        Self {
            total,
            share,
            balances,
        }
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn share(&self) -> Decimal {
        self.share
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Balance> {
        self.balances.iter()
    }

    pub fn get(&self, participant: &ParticipantId) -> Option<&Balance> {
        self.balances.iter().find(|b| &b.participant == participant)
    }

    /// Net amount for a participant, zero if unknown.
    pub fn net_amount(&self, participant: &ParticipantId) -> Decimal {
        self.get(participant)
            .map(|b| b.net_amount)
            .unwrap_or(Decimal::ZERO)
    }

    /// Participants in iteration order.
    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.balances.iter().map(|b| &b.participant)
    }

    /// Sum of all net amounts. Zero when the share divisor matches the
    /// number of participants in the sheet.
    pub fn net_sum(&self) -> Decimal {
        self.balances.iter().map(|b| b.net_amount).sum()
    }

    /// True when the net amounts cancel out within `epsilon`.
    pub fn is_balanced(&self, epsilon: Decimal) -> bool {
        self.net_sum().abs() <= epsilon
    }

    /// True when every participant is within `epsilon` of zero.
    pub fn is_settled(&self, epsilon: Decimal) -> bool {
        self.balances.iter().all(|b| b.is_settled(epsilon))
    }

    /// Apply a payment: the debtor's position rises, the creditor's falls.
    /// Parties missing from the sheet are ignored.
    pub fn apply_transfer(&mut self, transfer: &Transfer) {
        for balance in &mut self.balances {
            if balance.participant == transfer.from {
                balance.net_amount += transfer.amount;
            } else if balance.participant == transfer.to {
                balance.net_amount -= transfer.amount;
            }
        }
    }

    /// The sheet as it would look after every transfer was paid.
    pub fn after_transfers<'a>(&self, transfers: impl IntoIterator<Item = &'a Transfer>) -> Self {
        let mut sheet = self.clone();
        for transfer in transfers {
            sheet.apply_transfer(transfer);
        }
        sheet
    }
}

impl<'a> IntoIterator for &'a BalanceSheet {
    type Item = &'a Balance;
    type IntoIter = std::slice::Iter<'a, Balance>;

    fn into_iter(self) -> Self::IntoIter {
        self.balances.iter()
    }
}
