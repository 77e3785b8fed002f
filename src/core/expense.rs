use crate::core::error::SettlementError;
use crate::core::participant::ParticipantId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// A single recorded expense: `participant` paid `amount` for the group.
///
/// Records are immutable once created. Only the payer and the amount take
/// part in settlement; the id, description and timestamp are carried for
/// storage and display.
///
/// # Examples
///
/// ```
/// use expense_settlement::core::expense::ExpenseRecord;
/// use expense_settlement::core::participant::ParticipantId;
/// use rust_decimal_macros::dec;
///
/// let record = ExpenseRecord::new(ParticipantId::new("Alice"), dec!(42.50))
///     .unwrap()
///     .with_description("groceries");
///
/// assert_eq!(record.amount(), dec!(42.50));
/// assert_eq!(record.description(), Some("groceries"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    id: Uuid,
    participant: ParticipantId,
    /// Non-negative.
    amount: Decimal,
    #[serde(default)]
    description: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl ExpenseRecord {
    /// Create a new record stamped with the current time.
    ///
    /// Returns [`SettlementError::InvalidAmount`] if `amount` is negative.
    pub fn new(participant: ParticipantId, amount: Decimal) -> Result<Self, SettlementError> {
        Self::with_id(Uuid::new_v4(), participant, amount)
    }

    /// Create a record with a specific ID (useful for testing / determinism).
    pub fn with_id(
        id: Uuid,
        participant: ParticipantId,
        amount: Decimal,
    ) -> Result<Self, SettlementError> {
        if amount < Decimal::ZERO {
            return Err(SettlementError::invalid_amount(&participant, amount));
        }
        Ok(Self {
            id,
            participant,
            amount,
            description: None,
            recorded_at: Utc::now(),
        })
    }

    /// Create a record from a floating point amount.
    ///
    /// NaN, infinities, negative values and magnitudes outside the decimal
    /// range are rejected. Finite values are converted through their
    /// shortest decimal representation, so `100.005_f64` becomes exactly
    /// `100.005`.
    pub fn from_f64(participant: ParticipantId, amount: f64) -> Result<Self, SettlementError> {
        if !amount.is_finite() {
            return Err(SettlementError::invalid_amount(&participant, amount));
        }
        let decimal = Decimal::from_str(&amount.to_string())
            .map_err(|_| SettlementError::invalid_amount(&participant, amount))?;
        Self::new(participant, decimal)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_recorded_at(mut self, recorded_at: DateTime<Utc>) -> Self {
        self.recorded_at = recorded_at;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// Rejection reasons for a user-typed amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountInputError {
    #[error("'{0}' is not a valid amount")]
    Malformed(String),
    #[error("amount must be positive, got {0}")]
    NotPositive(Decimal),
}

/// Parse an amount typed by a person.
///
/// Accepts either `.` or `,` as the decimal separator and surrounding
/// whitespace. The amount must be strictly positive: a zero expense is
/// meaningless at entry time even though the engine tolerates it.
pub fn parse_amount(input: &str) -> Result<Decimal, AmountInputError> {
    let normalized = input.trim().replace(',', ".");
    let amount = Decimal::from_str(&normalized)
        .map_err(|_| AmountInputError::Malformed(input.trim().to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(AmountInputError::NotPositive(amount));
    }
    Ok(amount)
}

/// An ordered log of expenses, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseLog {
    expenses: Vec<ExpenseRecord>,
}

impl ExpenseLog {
    pub fn new() -> Self {
        Self {
            expenses: Vec::new(),
        }
    }

    pub fn add(&mut self, record: ExpenseRecord) {
        self.expenses.push(record);
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Sum of every recorded amount, saturating at `Decimal::MAX`.
    pub fn total(&self) -> Decimal {
        saturating_sum(self.expenses.iter())
    }

    /// Distinct payers in order of first appearance.
    pub fn participants(&self) -> Vec<ParticipantId> {
        let mut seen = HashSet::new();
        self.expenses
            .iter()
            .map(|e| e.participant())
            .filter(|p| seen.insert(*p))
            .cloned()
            .collect()
    }

    /// Records paid by one participant, in log order.
    pub fn for_participant<'a>(
        &'a self,
        participant: &'a ParticipantId,
    ) -> impl Iterator<Item = &'a ExpenseRecord> + 'a {
        self.expenses
            .iter()
            .filter(move |e| e.participant() == participant)
    }
}

/// Sum of record amounts, saturating at `Decimal::MAX`. For display only:
/// the engine reports overflow as an error instead.
pub fn saturating_sum<'a>(records: impl IntoIterator<Item = &'a ExpenseRecord>) -> Decimal {
    records
        .into_iter()
        .fold(Decimal::ZERO, |sum, r| sum.saturating_add(r.amount()))
}

impl FromIterator<ExpenseRecord> for ExpenseLog {
    fn from_iter<T: IntoIterator<Item = ExpenseRecord>>(iter: T) -> Self {
        Self {
            expenses: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ExpenseLog {
    type Item = &'a ExpenseRecord;
    type IntoIter = std::slice::Iter<'a, ExpenseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.expenses.iter()
    }
}
