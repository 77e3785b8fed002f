use crate::core::balance::{Balance, BalanceSheet};
use crate::core::error::SettlementError;
use crate::core::expense::ExpenseRecord;
use crate::core::participant::ParticipantId;
use crate::core::transfer::Transfer;
use crate::settlement::config::SettlementConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Balances together with the transfers that clear them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    balances: BalanceSheet,
    transfers: Vec<Transfer>,
    epsilon: Decimal,
}

impl Settlement {
    pub fn balances(&self) -> &BalanceSheet {
        &self.balances
    }

    /// Transfers in the order they were generated.
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Tolerance the plan was computed with.
    pub fn epsilon(&self) -> Decimal {
        self.epsilon
    }

    /// True when there was nothing recorded to settle.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum of all transfer amounts.
    pub fn total_transferred(&self) -> Decimal {
        self.transfers.iter().map(|t| t.amount).sum()
    }

    /// True when paying every transfer leaves each balance within tolerance.
    ///
    /// Only meaningful for a zero-sum sheet: with a fixed group size larger
    /// than the number of payers nobody in the sheet can cover the absent
    /// members' share. See [`Settlement::closure_check`].
    pub fn closes_balances(&self) -> bool {
        self.balances
            .after_transfers(&self.transfers)
            .is_settled(self.epsilon)
    }

    /// [`Settlement::closes_balances`] when the sheet is zero-sum, `None`
    /// otherwise.
    pub fn closure_check(&self) -> Option<bool> {
        self.balances
            .is_balanced(self.epsilon)
            .then(|| self.closes_balances())
    }
}

/// The settlement engine.
///
/// Stateless: every operation is a pure function of its arguments, so the
/// engine can be used from any number of threads at once.
pub struct SettlementEngine;

impl SettlementEngine {
    /// Compute each participant's balance against `share`.
    ///
    /// Amounts are summed per participant in order of first appearance and
    /// `net_amount = spent - share`. An empty input, or one whose total is
    /// exactly zero, yields an empty sheet.
    ///
    /// # Errors
    ///
    /// - [`SettlementError::InvalidAmount`] if a record carries a negative
    ///   amount (possible for deserialised records), or if the spend no
    ///   longer fits in a `Decimal`.
    /// - [`SettlementError::InvalidConfiguration`] if `share` is not
    ///   positive while there is something to settle.
    pub fn compute_balances(
        records: &[ExpenseRecord],
        share: Decimal,
    ) -> Result<BalanceSheet, SettlementError> {
        let totals = Self::aggregate(records)?;
        Self::balances_from_totals(totals, share)
    }

    /// Compute the transfers that bring every balance to zero.
    ///
    /// # Algorithm
    ///
    /// 1. Participants above `epsilon` are creditors, those below
    ///    `-epsilon` are debtors (by absolute value); the rest are settled.
    /// 2. Both sides are sorted by amount, largest first. The sort is
    ///    stable, so ties keep first-seen order.
    /// 3. The largest remaining debtor pays the largest remaining creditor
    ///    `min(credit, debt)`.
    /// 4. A side whose remainder falls below `epsilon` is done. Both sides
    ///    can finish on the same step.
    /// 5. The loop ends when either side runs out. Leftover amounts below
    ///    `epsilon` are rounding noise and are dropped.
    ///
    /// Every step finishes at least one party, so at most
    /// `creditors + debtors - 1` transfers are produced. The result is not
    /// always the smallest possible plan but it is fully deterministic.
    pub fn compute_settlement(balances: &BalanceSheet, epsilon: Decimal) -> Vec<Transfer> {
        let mut creditors: Vec<(&ParticipantId, Decimal)> = balances
            .iter()
            .filter(|b| b.net_amount > epsilon)
            .map(|b| (&b.participant, b.net_amount))
            .collect();
        let mut debtors: Vec<(&ParticipantId, Decimal)> = balances
            .iter()
            .filter(|b| b.net_amount < -epsilon)
            .map(|b| (&b.participant, b.net_amount.abs()))
            .collect();

        creditors.sort_by(|a, b| b.1.cmp(&a.1));
        debtors.sort_by(|a, b| b.1.cmp(&a.1));

        let mut transfers = Vec::new();
        let mut creditor_index = 0;
        let mut debtor_index = 0;

        while creditor_index < creditors.len() && debtor_index < debtors.len() {
            let (creditor, credit) = &mut creditors[creditor_index];
            let (debtor, debt) = &mut debtors[debtor_index];

            let amount = (*credit).min(*debt);
            log::trace!("{} pays {} {}", debtor, creditor, amount);
            transfers.push(Transfer::new((*debtor).clone(), (*creditor).clone(), amount));

            *credit -= amount;
            *debt -= amount;

            // One side always reaches zero, so the loop always advances.
            if is_exhausted(*credit, epsilon) {
                creditor_index += 1;
            }
            if is_exhausted(*debt, epsilon) {
                debtor_index += 1;
            }
        }

        for (party, rest) in creditors[creditor_index..]
            .iter()
            .chain(&debtors[debtor_index..])
        {
            if !rest.is_zero() {
                log::debug!("dropping residual {} for {}", rest, party);
            }
        }

        transfers
    }

    /// Balances and transfers for `records` under `config`.
    ///
    /// The share is `total / divisor`, the divisor coming from the
    /// configured [`SharePolicy`](crate::settlement::config::SharePolicy).
    /// Roster members without expenses are added with nothing spent.
    pub fn settle(
        records: &[ExpenseRecord],
        config: &SettlementConfig,
    ) -> Result<Settlement, SettlementError> {
        config.validate()?;

        let mut totals = Self::aggregate(records)?;
        let payers = totals.len();
        for member in config.roster() {
            if !totals.iter().any(|(p, _)| p == member) {
                totals.push((member.clone(), Decimal::ZERO));
            }
        }

        let total = checked_total(&totals)?;
        let balances = if total.is_zero() {
            BalanceSheet::empty()
        } else {
            let share = config.share_for(total, payers)?;
            Self::balances_from_totals(totals, share)?
        };
        let transfers = Self::compute_settlement(&balances, config.epsilon);

        log::debug!(
            "settled {} records: {} balances, {} transfers",
            records.len(),
            balances.len(),
            transfers.len()
        );

        Ok(Settlement {
            balances,
            transfers,
            epsilon: config.epsilon,
        })
    }

    /// Per-participant spend in first-seen order.
    fn aggregate(
        records: &[ExpenseRecord],
    ) -> Result<Vec<(ParticipantId, Decimal)>, SettlementError> {
        let mut totals: Vec<(ParticipantId, Decimal)> = Vec::new();
        let mut index: HashMap<&ParticipantId, usize> = HashMap::new();

        for record in records {
            if record.amount() < Decimal::ZERO {
                return Err(SettlementError::invalid_amount(
                    record.participant(),
                    record.amount(),
                ));
            }
            match index.get(record.participant()) {
                Some(&i) => {
                    totals[i].1 = totals[i].1.checked_add(record.amount()).ok_or_else(|| {
                        SettlementError::invalid_amount(record.participant(), record.amount())
                    })?;
                }
                None => {
                    index.insert(record.participant(), totals.len());
                    totals.push((record.participant().clone(), record.amount()));
                }
            }
        }

        Ok(totals)
    }

    fn balances_from_totals(
        totals: Vec<(ParticipantId, Decimal)>,
        share: Decimal,
    ) -> Result<BalanceSheet, SettlementError> {
        let total = checked_total(&totals)?;
        if total.is_zero() {
            return Ok(BalanceSheet::empty());
        }
        if share <= Decimal::ZERO {
            return Err(SettlementError::InvalidConfiguration(format!(
                "share must be positive, got {share}"
            )));
        }

        log::debug!(
            "aggregated {} participants, total {}, share {}",
            totals.len(),
            total,
            share
        );

        let balances = totals
            .into_iter()
            .map(|(participant, spent)| Balance::new(participant, spent, share))
            .collect();
        Ok(BalanceSheet::new(total, share, balances))
    }
}

/// Sum of per-participant spend. Overflow is reported against the
/// participant whose spend no longer fits.
fn checked_total(totals: &[(ParticipantId, Decimal)]) -> Result<Decimal, SettlementError> {
    totals.iter().try_fold(Decimal::ZERO, |sum, (participant, spent)| {
        sum.checked_add(*spent)
            .ok_or_else(|| SettlementError::invalid_amount(participant, spent))
    })
}

fn is_exhausted(remaining: Decimal, epsilon: Decimal) -> bool {
    remaining <= Decimal::ZERO || remaining < epsilon
}

impl std::fmt::Display for Settlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Settlement ===")?;
        writeln!(f, "Total:          {:.2}", self.balances.total())?;
        writeln!(f, "Share:          {:.2}", self.balances.share())?;
        writeln!(f, "Transfers:      {}", self.transfers.len())?;
        if let Some(closes) = self.closure_check() {
            writeln!(f, "Closes:         {}", closes)?;
        }

        if !self.balances.is_empty() {
            writeln!(f, "\n--- Balances ---")?;
            for balance in &self.balances {
                writeln!(f, "  {:<15} {:>+12.2}", balance.participant.as_str(), balance.net_amount)?;
            }
        }
        if !self.transfers.is_empty() {
            writeln!(f, "\n--- Transfers ---")?;
            for transfer in &self.transfers {
                writeln!(f, "  {}", transfer)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::balance::BalanceStatus;
    use crate::settlement::config::SharePolicy;
    use rust_decimal_macros::dec;

    fn records(entries: &[(&str, Decimal)]) -> Vec<ExpenseRecord> {
        entries
            .iter()
            .map(|(who, amount)| ExpenseRecord::new(ParticipantId::new(*who), *amount).unwrap())
            .collect()
    }

    fn eps() -> Decimal {
        dec!(0.01)
    }

    fn pairs(transfers: &[Transfer]) -> Vec<(&str, &str, Decimal)> {
        transfers
            .iter()
            .map(|t| (t.from.as_str(), t.to.as_str(), t.amount))
            .collect()
    }

    #[test]
    fn test_single_payer_is_owed_by_everyone() {
        let input = records(&[("Alice", dec!(300)), ("Bob", dec!(0)), ("Carol", dec!(0))]);
        let sheet = SettlementEngine::compute_balances(&input, dec!(100)).unwrap();

        assert_eq!(sheet.net_amount(&"Alice".into()), dec!(200));
        assert_eq!(sheet.net_amount(&"Bob".into()), dec!(-100));
        assert_eq!(sheet.net_amount(&"Carol".into()), dec!(-100));

        let transfers = SettlementEngine::compute_settlement(&sheet, eps());
        assert_eq!(
            pairs(&transfers),
            vec![("Bob", "Alice", dec!(100)), ("Carol", "Alice", dec!(100))]
        );
    }

    #[test]
    fn test_creditor_ties_keep_first_seen_order() {
        let input = records(&[("Alice", dec!(150)), ("Bob", dec!(150)), ("Carol", dec!(0))]);
        let sheet = SettlementEngine::compute_balances(&input, dec!(100)).unwrap();
        let transfers = SettlementEngine::compute_settlement(&sheet, eps());
        assert_eq!(
            pairs(&transfers),
            vec![("Carol", "Alice", dec!(50)), ("Carol", "Bob", dec!(50))]
        );
    }

    #[test]
    fn test_empty_input_settles_nothing() {
        let sheet = SettlementEngine::compute_balances(&[], dec!(100)).unwrap();
        assert!(sheet.is_empty());
        assert!(SettlementEngine::compute_settlement(&sheet, eps()).is_empty());
    }

    #[test]
    fn test_zero_total_settles_nothing() {
        let input = records(&[("Alice", dec!(0)), ("Bob", dec!(0))]);
        // A zero share is only rejected when there is something to split.
        let sheet = SettlementEngine::compute_balances(&input, Decimal::ZERO).unwrap();
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_equal_spend_needs_no_transfers() {
        let input = records(&[("Alice", dec!(100)), ("Bob", dec!(100)), ("Carol", dec!(100))]);
        let sheet = SettlementEngine::compute_balances(&input, dec!(100)).unwrap();
        assert!(sheet.is_settled(eps()));
        assert!(SettlementEngine::compute_settlement(&sheet, eps()).is_empty());
    }

    #[test]
    fn test_rounding_noise_is_suppressed() {
        let input = records(&[
            ("Alice", dec!(100.005)),
            ("Bob", dec!(99.995)),
            ("Carol", dec!(100)),
        ]);
        let sheet = SettlementEngine::compute_balances(&input, dec!(100)).unwrap();
        assert!(sheet.is_settled(eps()));
        assert!(SettlementEngine::compute_settlement(&sheet, eps()).is_empty());
    }

    #[test]
    fn test_repeated_payments_are_summed() {
        let input = records(&[
            ("Bob", dec!(40)),
            ("Alice", dec!(100)),
            ("Bob", dec!(20)),
        ]);
        let sheet = SettlementEngine::compute_balances(&input, dec!(80)).unwrap();
        let order: Vec<_> = sheet.participants().map(|p| p.as_str()).collect();
        assert_eq!(order, vec!["Bob", "Alice"]);
        assert_eq!(sheet.get(&"Bob".into()).unwrap().spent, dec!(60));
        assert_eq!(sheet.total(), dec!(160));
    }

    #[test]
    fn test_both_sides_finish_on_same_step() {
        // Alice +50, Bob +30, Carol -50, Dan -30
        let input = records(&[
            ("Alice", dec!(150)),
            ("Bob", dec!(130)),
            ("Carol", dec!(50)),
            ("Dan", dec!(70)),
        ]);
        let sheet = SettlementEngine::compute_balances(&input, dec!(100)).unwrap();
        let transfers = SettlementEngine::compute_settlement(&sheet, eps());
        assert_eq!(
            pairs(&transfers),
            vec![("Carol", "Alice", dec!(50)), ("Dan", "Bob", dec!(30))]
        );
    }

    #[test]
    fn test_negative_share_rejected() {
        let input = records(&[("Alice", dec!(10))]);
        assert!(matches!(
            SettlementEngine::compute_balances(&input, dec!(-1)),
            Err(SettlementError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_deserialized_negative_amount_rejected() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "participant": "Mallory",
            "amount": "-10",
            "recorded_at": "2024-01-01T00:00:00Z"
        }"#;
        let record: ExpenseRecord = serde_json::from_str(json).unwrap();
        let err = SettlementEngine::compute_balances(&[record], dec!(10)).unwrap_err();
        assert_eq!(
            err,
            SettlementError::InvalidAmount {
                participant: "Mallory".into(),
                amount: "-10".to_string(),
            }
        );
    }

    #[test]
    fn test_settle_with_default_three_way_split() {
        let input = records(&[("Alice", dec!(300)), ("Bob", dec!(0)), ("Carol", dec!(0))]);
        let settlement = SettlementEngine::settle(&input, &SettlementConfig::default()).unwrap();
        assert_eq!(settlement.balances().share(), dec!(100));
        assert_eq!(settlement.transfers().len(), 2);
        assert_eq!(settlement.total_transferred(), dec!(200));
        assert!(settlement.closes_balances());
    }

    #[test]
    fn test_settle_with_roster_adds_silent_members() {
        let config = SettlementConfig::default().with_policy(SharePolicy::Roster(vec![
            "Alice".into(),
            "Bob".into(),
            "Carol".into(),
            "Dan".into(),
        ]));
        let input = records(&[("Bob", dec!(100)), ("Alice", dec!(300))]);
        let settlement = SettlementEngine::settle(&input, &config).unwrap();

        let order: Vec<_> = settlement
            .balances()
            .participants()
            .map(|p| p.as_str())
            .collect();
        assert_eq!(order, vec!["Bob", "Alice", "Carol", "Dan"]);
        assert_eq!(settlement.balances().share(), dec!(100));
        assert!(settlement.balances().is_balanced(eps()));
        assert_eq!(
            pairs(settlement.transfers()),
            vec![("Carol", "Alice", dec!(100)), ("Dan", "Alice", dec!(100))]
        );
    }

    #[test]
    fn test_settle_among_payers_only() {
        let config = SettlementConfig::default().with_policy(SharePolicy::DistinctParticipants);
        let input = records(&[("Alice", dec!(90)), ("Bob", dec!(30))]);
        let settlement = SettlementEngine::settle(&input, &config).unwrap();
        assert_eq!(settlement.balances().share(), dec!(60));
        assert_eq!(
            pairs(settlement.transfers()),
            vec![("Bob", "Alice", dec!(30))]
        );
    }

    #[test]
    fn test_settle_rejects_invalid_config() {
        let config = SettlementConfig::default().with_policy(SharePolicy::FixedGroupSize(0));
        assert!(SettlementEngine::settle(&[], &config).is_err());
    }

    #[test]
    fn test_thirds_leave_only_sub_cent_residue() {
        let input = records(&[("Alice", dec!(100)), ("Bob", dec!(0)), ("Carol", dec!(0))]);
        let settlement = SettlementEngine::settle(&input, &SettlementConfig::default()).unwrap();
        assert_eq!(settlement.transfers().len(), 2);
        assert!(settlement.closes_balances());
        for transfer in settlement.transfers() {
            assert_eq!(transfer.amount.round_dp(2), dec!(33.33));
        }
    }

    #[test]
    fn test_overflowing_spend_is_rejected() {
        // Each participant fits on their own, the group total does not.
        let input = records(&[("Alice", Decimal::MAX), ("Bob", Decimal::MAX)]);
        let err = SettlementEngine::settle(&input, &SettlementConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SettlementError::InvalidAmount {
                participant: "Bob".into(),
                amount: Decimal::MAX.to_string(),
            }
        );
        assert!(SettlementEngine::compute_balances(&input, dec!(1)).is_err());
    }

    #[test]
    fn test_overflowing_repeat_payer_is_rejected() {
        let input = records(&[("Alice", Decimal::MAX), ("Alice", dec!(1))]);
        let err = SettlementEngine::compute_balances(&input, dec!(1)).unwrap_err();
        assert!(matches!(
            err,
            SettlementError::InvalidAmount { ref participant, .. } if participant.as_str() == "Alice"
        ));
    }

    #[test]
    fn test_balance_exactly_epsilon_away_is_settled() {
        let input = records(&[("Alice", dec!(100.01)), ("Bob", dec!(99.99))]);
        let sheet = SettlementEngine::compute_balances(&input, dec!(100)).unwrap();

        assert_eq!(sheet.net_amount(&"Alice".into()), dec!(0.01));
        assert_eq!(sheet.net_amount(&"Bob".into()), dec!(-0.01));
        for balance in &sheet {
            assert_eq!(balance.status(eps()), BalanceStatus::Settled);
            assert!(balance.is_settled(eps()));
        }
        assert!(SettlementEngine::compute_settlement(&sheet, eps()).is_empty());
    }

    #[test]
    fn test_balance_just_outside_epsilon_is_paid() {
        let input = records(&[("Alice", dec!(100.011)), ("Bob", dec!(99.989))]);
        let sheet = SettlementEngine::compute_balances(&input, dec!(100)).unwrap();

        assert_eq!(sheet.get(&"Alice".into()).unwrap().status(eps()), BalanceStatus::Owed);
        assert_eq!(sheet.get(&"Bob".into()).unwrap().status(eps()), BalanceStatus::Owes);
        let transfers = SettlementEngine::compute_settlement(&sheet, eps());
        assert_eq!(pairs(&transfers), vec![("Bob", "Alice", dec!(0.011))]);
    }

    #[test]
    fn test_closure_check_skipped_for_partial_group() {
        // Three-way split with a single payer: the sheet is not zero-sum.
        let input = records(&[("Alice", dec!(300))]);
        let settlement = SettlementEngine::settle(&input, &SettlementConfig::default()).unwrap();
        assert!(!settlement.balances().is_balanced(eps()));
        assert_eq!(settlement.closure_check(), None);
        assert!(!settlement.to_string().contains("Closes"));

        let input = records(&[("Alice", dec!(300)), ("Bob", dec!(0)), ("Carol", dec!(0))]);
        let settlement = SettlementEngine::settle(&input, &SettlementConfig::default()).unwrap();
        assert_eq!(settlement.closure_check(), Some(true));
        assert!(settlement.to_string().contains("Closes:         true"));
    }
}
