//! Human-readable summaries of expenses and settlements.
//!
//! Everything here is presentation: amounts are rounded to cents for
//! display only, the engine's numbers are never altered.

use crate::core::balance::BalanceStatus;
use crate::core::expense::{saturating_sum, ExpenseLog, ExpenseRecord};
use crate::core::participant::ParticipantId;
use crate::settlement::engine::Settlement;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

/// Listings show at most this many of the most recent expenses.
pub const RECENT_LIMIT: usize = 15;

/// Format an amount with exactly two decimals, rounding half away from zero.
pub fn money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // Avoid printing "-0.00" for sub-cent negatives.
    if rounded.is_zero() {
        return "0.00".to_string();
    }
    format!("{:.2}", rounded)
}

fn signed_money(amount: Decimal) -> String {
    let text = money(amount);
    if amount > Decimal::ZERO && text != "0.00" {
        format!("+{text}")
    } else {
        text
    }
}

fn per_head(total: Decimal, divisor: Decimal) -> Decimal {
    if divisor > Decimal::ZERO {
        total / divisor
    } else {
        Decimal::ZERO
    }
}

/// One participant's own expenses.
#[derive(Debug, Clone)]
pub struct ParticipantSummary {
    pub participant: ParticipantId,
    /// Most recent first, at most [`RECENT_LIMIT`].
    pub recent: Vec<ExpenseRecord>,
    /// Number of expenses recorded in total.
    pub count: usize,
    /// Sum of all the participant's expenses.
    pub total: Decimal,
    /// The participant's part of their own spend.
    pub share: Decimal,
}

impl ParticipantSummary {
    /// `records` must already be newest first; `divisor` is the group size.
    pub fn new(participant: ParticipantId, records: Vec<ExpenseRecord>, divisor: Decimal) -> Self {
        let total = saturating_sum(&records);
        let count = records.len();
        Self {
            participant,
            recent: records.into_iter().take(RECENT_LIMIT).collect(),
            count,
            total,
            share: per_head(total, divisor),
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParticipantSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "{} has no expenses yet", self.participant);
        }
        writeln!(f, "Expenses of {}:\n", self.participant)?;
        for record in &self.recent {
            writeln!(f, "• {}", ExpenseLine(record))?;
        }
        if self.count > self.recent.len() {
            writeln!(f, "  … and {} older", self.count - self.recent.len())?;
        }
        writeln!(f, "\nTotal: {}", money(self.total))?;
        write!(f, "Your share of it: {}", money(self.share))
    }
}

/// Expenses of the whole group.
#[derive(Debug, Clone)]
pub struct GroupSummary {
    /// Most recent first, at most [`RECENT_LIMIT`].
    pub recent: Vec<ExpenseRecord>,
    /// Spend per participant in order of first appearance.
    pub per_participant: Vec<(ParticipantId, Decimal)>,
    pub count: usize,
    pub total: Decimal,
    /// Share per person.
    pub share: Decimal,
}

impl GroupSummary {
    pub fn new(log: &ExpenseLog, divisor: Decimal) -> Self {
        let mut newest: Vec<ExpenseRecord> = log.records().to_vec();
        newest.sort_by(|a, b| b.recorded_at().cmp(&a.recorded_at()));
        newest.truncate(RECENT_LIMIT);

        let per_participant = log
            .participants()
            .into_iter()
            .map(|p| {
                let spent = saturating_sum(log.for_participant(&p));
                (p, spent)
            })
            .collect();

        let total = log.total();
        Self {
            recent: newest,
            per_participant,
            count: log.len(),
            total,
            share: per_head(total, divisor),
        }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            return write!(f, "No expenses recorded");
        }
        writeln!(f, "All expenses:\n")?;
        for record in &self.recent {
            writeln!(f, "• {}: {}", record.participant(), ExpenseLine(record))?;
        }
        if self.count > self.recent.len() {
            writeln!(f, "  … and {} older", self.count - self.recent.len())?;
        }
        writeln!(f, "\nPer participant:")?;
        for (participant, spent) in &self.per_participant {
            writeln!(f, "• {}: {}", participant, money(*spent))?;
        }
        writeln!(f, "\nTotal: {}", money(self.total))?;
        write!(f, "Share per person: {}", money(self.share))
    }
}

/// `amount - description (date)` for one record.
struct ExpenseLine<'a>(&'a ExpenseRecord);

impl fmt::Display for ExpenseLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;
        write!(f, "{}", money(record.amount()))?;
        if let Some(description) = record.description() {
            write!(f, " - {description}")?;
        }
        write!(f, " ({})", record.recorded_at().format("%Y-%m-%d"))
    }
}

fn status_marker(status: BalanceStatus) -> &'static str {
    match status {
        BalanceStatus::Settled => "[=]",
        BalanceStatus::Owed => "[+]",
        BalanceStatus::Owes => "[-]",
    }
}

/// The balance message: totals, each participant's position and the
/// numbered transfers.
pub struct SettlementReport<'a>(pub &'a Settlement);

impl fmt::Display for SettlementReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settlement = self.0;
        if settlement.is_empty() {
            return write!(f, "Nothing to settle: no expenses recorded");
        }

        let balances = settlement.balances();
        let epsilon = settlement.epsilon();
        writeln!(f, "Current settlement")?;
        writeln!(f, "Total spent: {}", money(balances.total()))?;
        writeln!(f, "Share per person: {}", money(balances.share()))?;
        write!(f, "\nBalances:")?;
        for balance in balances {
            let status = balance.status(epsilon);
            let amount = if status == BalanceStatus::Settled {
                money(Decimal::ZERO)
            } else {
                signed_money(balance.net_amount)
            };
            write!(
                f,
                "\n{} {}: {}",
                status_marker(status),
                balance.participant,
                amount
            )?;
        }

        if settlement.transfers().is_empty() {
            return write!(f, "\n\nEveryone is square.");
        }
        write!(f, "\n\nWho pays whom:")?;
        for (i, transfer) in settlement.transfers().iter().enumerate() {
            write!(
                f,
                "\n{}. {} → {}: {}",
                i + 1,
                transfer.from,
                transfer.to,
                money(transfer.amount)
            )?;
        }
        Ok(())
    }
}

pub fn render_settlement(settlement: &Settlement) -> String {
    SettlementReport(settlement).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::config::SettlementConfig;
    use crate::settlement::engine::SettlementEngine;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn record(who: &str, amount: Decimal) -> ExpenseRecord {
        ExpenseRecord::new(ParticipantId::new(who), amount).unwrap()
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(dec!(100)), "100.00");
        assert_eq!(money(dec!(33.335)), "33.34");
        assert_eq!(money(dec!(-0.004)), "0.00");
        assert_eq!(signed_money(dec!(50)), "+50.00");
        assert_eq!(signed_money(dec!(-50)), "-50.00");
    }

    #[test]
    fn test_render_settlement() {
        let log: ExpenseLog = vec![
            record("Alice", dec!(150)),
            record("Bob", dec!(150)),
            record("Carol", dec!(0)),
        ]
        .into_iter()
        .collect();
        let settlement =
            SettlementEngine::settle(log.records(), &SettlementConfig::default()).unwrap();

        let text = render_settlement(&settlement);
        assert_eq!(
            text,
            "Current settlement\n\
             Total spent: 300.00\n\
             Share per person: 100.00\n\
             \n\
             Balances:\n\
             [+] Alice: +50.00\n\
             [+] Bob: +50.00\n\
             [-] Carol: -100.00\n\
             \n\
             Who pays whom:\n\
             1. Carol → Alice: 50.00\n\
             2. Carol → Bob: 50.00"
        );
    }

    #[test]
    fn test_render_square_and_empty() {
        let config = SettlementConfig::default();
        let empty = SettlementEngine::settle(&[], &config).unwrap();
        assert_eq!(
            render_settlement(&empty),
            "Nothing to settle: no expenses recorded"
        );

        let even = vec![
            record("Alice", dec!(100.005)),
            record("Bob", dec!(99.995)),
            record("Carol", dec!(100)),
        ];
        let text = render_settlement(&SettlementEngine::settle(&even, &config).unwrap());
        assert!(text.contains("[=] Alice: 0.00"));
        assert!(text.ends_with("Everyone is square."));
    }

    #[test]
    fn test_participant_summary_limits_listing() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let records: Vec<_> = (0..20)
            .rev()
            .map(|i| record("Alice", dec!(3)).with_recorded_at(base + Duration::days(i)))
            .collect();
        let summary = ParticipantSummary::new("Alice".into(), records, dec!(3));

        assert_eq!(summary.recent.len(), RECENT_LIMIT);
        assert_eq!(summary.count, 20);
        assert_eq!(summary.total, dec!(60));
        assert_eq!(summary.share, dec!(20));

        let text = summary.render();
        assert!(text.starts_with("Expenses of Alice:"));
        assert!(text.contains("• 3.00 (2024-03-20)"));
        assert!(text.contains("… and 5 older"));
        assert!(text.ends_with("Your share of it: 20.00"));
    }

    #[test]
    fn test_group_summary() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let log: ExpenseLog = vec![
            record("Bob", dec!(10)).with_recorded_at(base),
            record("Alice", dec!(20))
                .with_description("pizza")
                .with_recorded_at(base + Duration::days(1)),
            record("Bob", dec!(30)).with_recorded_at(base + Duration::days(2)),
        ]
        .into_iter()
        .collect();

        let summary = GroupSummary::new(&log, dec!(3));
        assert_eq!(summary.total, dec!(60));
        assert_eq!(summary.share, dec!(20));
        assert_eq!(
            summary.per_participant,
            vec![
                (ParticipantId::new("Bob"), dec!(40)),
                (ParticipantId::new("Alice"), dec!(20))
            ]
        );
        assert_eq!(summary.recent[0].amount(), dec!(30));

        let text = summary.render();
        assert!(text.contains("• Alice: 20.00 - pizza (2024-03-02)"));
        assert!(text.contains("• Bob: 40.00"));
        assert!(text.ends_with("Share per person: 20.00"));
    }

    #[test]
    fn test_reports_render_through_display() {
        let log: ExpenseLog = vec![record("Alice", dec!(90)), record("Bob", dec!(30))]
            .into_iter()
            .collect();
        let settlement =
            SettlementEngine::settle(log.records(), &SettlementConfig::default()).unwrap();

        let report = format!("{}", SettlementReport(&settlement));
        assert_eq!(report, render_settlement(&settlement));
        assert!(report.ends_with("1. Bob → Alice: 10.00"));

        let group = GroupSummary::new(&log, dec!(3));
        assert_eq!(format!("{group}"), group.render());

        let alice = ParticipantSummary::new("Alice".into(), log.records()[..1].to_vec(), dec!(3));
        assert_eq!(format!("{alice}"), alice.render());
        assert!(alice.render().contains("Total: 90.00"));
    }

    #[test]
    fn test_empty_summaries() {
        let summary = ParticipantSummary::new("Dan".into(), vec![], dec!(3));
        assert_eq!(summary.render(), "Dan has no expenses yet");
        assert_eq!(
            GroupSummary::new(&ExpenseLog::new(), dec!(3)).render(),
            "No expenses recorded"
        );
    }
}
